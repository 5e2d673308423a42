use std::io::{self, Write};
use std::path::Path;

use crate::config::{
    AppCredentials, AppFile, UserCredentials, DEFAULT_APP_FILE, DEFAULT_USER_OPTS_FILE,
};
use crate::error::{ReleaseNotesError, Result};
use crate::writer::write_file;

fn prompt(question: &str) -> Result<String> {
    print!("{question}");
    io::stdout().flush()?;

    let mut input = String::new();
    io::stdin().read_line(&mut input)?;
    Ok(input.trim().to_string())
}

fn required(question: &str, option: &'static str) -> Result<String> {
    let answer = prompt(question)?;
    if answer.is_empty() {
        return Err(ReleaseNotesError::MissingOptions {
            missing: vec![option],
        });
    }
    Ok(answer)
}

/// Interactively write the user and app credential files into `opts_dir`.
pub fn run(opts_dir: &Path) -> Result<()> {
    let user_path = opts_dir.join(DEFAULT_USER_OPTS_FILE);
    let app_path = opts_dir.join(DEFAULT_APP_FILE);

    if user_path.exists() || app_path.exists() {
        let answer = prompt(&format!(
            "Credential files already exist in {}. Overwrite? [y/N] ",
            opts_dir.display()
        ))?;
        if !answer.eq_ignore_ascii_case("y") {
            println!("Aborted.");
            return Ok(());
        }
    }

    println!("Release notes configuration");
    println!("===========================\n");

    let user = required("Atlassian account email: ", "user")?;
    let token = required(
        "API token (create one at https://id.atlassian.com/manage-profile/security/api-tokens): ",
        "token",
    )?;
    let app_id = required("OAuth app client ID: ", "app.appID")?;
    let app_secret = required("OAuth app client secret: ", "app.appSecret")?;

    write_file(&user_path, &UserCredentials { user, token })?;
    write_file(
        &app_path,
        &AppFile {
            app: AppCredentials { app_id, app_secret },
        },
    )?;

    println!("\nCredentials saved to {}", opts_dir.display());
    println!("Add a JIRA options file there, then run 'release-notes get -j <file>'.");

    Ok(())
}
