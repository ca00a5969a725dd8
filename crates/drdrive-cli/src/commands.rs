//! Command-line commands. Each one stands in for a screen of the mobile app.

use std::path::PathBuf;

use anyhow::{anyhow, Result};
use drdrive_core::auth::{SessionError, SessionManager};
use drdrive_core::models::{DiagnosisRequest, ImageAttachment, ProfileForm, Registration, User};
use drdrive_core::validation::{validate_sign_in, validate_sign_up, validate_year};
use drdrive_core::Config;
use tracing::warn;

use crate::navigation::{Navigator, Screen};
use crate::prompt;

/// Environment variables that prefill the sign-in prompt
const USERNAME_ENV: &str = "DRDRIVE_USERNAME";
const PASSWORD_ENV: &str = "DRDRIVE_PASSWORD";

pub const USAGE: &str = "\
Usage: drdrive <command>

Commands:
  login [username]                 Sign in
  register                         Create an account
  logout                           Sign out and forget the stored session
  whoami                           Show the signed-in user
  profile                          Edit your profile and vehicle details
  diagnose <problem> [--image P]   Describe a problem, optionally with a photo
  help                             Show this message";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Login { username: Option<String> },
    Register,
    Logout,
    Whoami,
    Profile,
    Diagnose { prompt: String, image: Option<PathBuf> },
    Help,
}

impl Command {
    pub fn parse(args: &[String]) -> Result<Self, String> {
        let Some((name, rest)) = args.split_first() else {
            return Ok(Command::Help);
        };

        match name.as_str() {
            "login" => Ok(Command::Login {
                username: rest.first().cloned(),
            }),
            "register" => Ok(Command::Register),
            "logout" => Ok(Command::Logout),
            "whoami" => Ok(Command::Whoami),
            "profile" => Ok(Command::Profile),
            "diagnose" => Self::parse_diagnose(rest),
            "help" | "--help" | "-h" => Ok(Command::Help),
            other => Err(format!("Unknown command: {}", other)),
        }
    }

    fn parse_diagnose(args: &[String]) -> Result<Self, String> {
        let mut words = Vec::new();
        let mut image = None;
        let mut iter = args.iter();

        while let Some(arg) = iter.next() {
            if arg == "--image" {
                let path = iter
                    .next()
                    .ok_or_else(|| "--image needs a file path".to_string())?;
                image = Some(PathBuf::from(path));
            } else {
                words.push(arg.as_str());
            }
        }

        Ok(Command::Diagnose {
            prompt: words.join(" "),
            image,
        })
    }
}

pub async fn run(
    command: Command,
    session: &SessionManager,
    navigator: &mut Navigator,
    config: &mut Config,
) -> Result<()> {
    match command {
        Command::Login { username } => login(session, config, username).await?,
        Command::Register => register(session).await?,
        Command::Logout => {
            session.sign_out().await;
        }
        Command::Whoami => whoami(session),
        Command::Profile => edit_profile(session).await?,
        Command::Diagnose { prompt, image } => diagnose(session, prompt, image).await?,
        Command::Help => println!("{}", USAGE),
    }

    if let Some(screen) = navigator.poll() {
        show(screen, session);
    }
    Ok(())
}

/// Render the screen the navigator moved to
pub fn show(screen: Screen, session: &SessionManager) {
    match screen {
        Screen::Splash => {}
        Screen::SignIn => println!("You are signed out. Run `drdrive login` to sign in."),
        Screen::Home => {
            if let Some(user) = session.user() {
                println!("Welcome, {}!", user.username);
                if let Some(vehicle) = user.vehicle_display() {
                    println!("Vehicle: {}", vehicle);
                }
            }
        }
    }
}

/// Turn a session error into what the user should read
fn explain(err: SessionError) -> anyhow::Error {
    if err.is_unauthorized() {
        anyhow!(
            "{}. Your session may have expired: run `drdrive logout`, then `drdrive login`.",
            err
        )
    } else {
        err.into()
    }
}

fn require_user(session: &SessionManager) -> Result<User> {
    session
        .user()
        .ok_or_else(|| SessionError::NotAuthenticated.into())
}

async fn login(session: &SessionManager, config: &mut Config, username: Option<String>) -> Result<()> {
    if let Some(user) = session.user() {
        println!("Already signed in as {}; signing in again.", user.username);
    }

    let username = match username.or_else(|| std::env::var(USERNAME_ENV).ok()) {
        Some(username) => username,
        None => {
            let last = config.last_username.clone().unwrap_or_default();
            prompt::with_default("Username", &last)?
        }
    };
    let password = match std::env::var(PASSWORD_ENV) {
        Ok(password) => password,
        Err(_) => prompt::password("Password")?,
    };

    validate_sign_in(&username, &password).map_err(|msg| anyhow!(msg))?;

    println!("Signing in...");
    session.sign_in(&username, &password).await.map_err(explain)?;

    config.last_username = Some(username);
    if let Err(e) = config.save() {
        warn!(error = %e, "Failed to save config");
    }
    Ok(())
}

async fn register(session: &SessionManager) -> Result<()> {
    println!("Account");
    let username = prompt::required("Username")?;
    let email = prompt::required("Email")?;
    let password = prompt::password("Password")?;
    let confirm = prompt::password("Confirm password")?;

    println!("\nPersonal");
    let phone = prompt::required("Phone")?;

    println!("\nVehicle");
    let registration = Registration {
        username,
        email,
        password,
        phone,
        year: prompt::optional("Year")?,
        make: prompt::optional("Make")?,
        model: prompt::optional("Model")?,
        chassis: prompt::optional("Chassis number")?,
    };

    validate_sign_up(&registration, &confirm).map_err(|msg| anyhow!(msg))?;

    println!("Creating account...");
    session.sign_up(&registration).await.map_err(explain)?;
    Ok(())
}

fn whoami(session: &SessionManager) {
    let Some(user) = session.user() else {
        println!("Not signed in.");
        return;
    };

    println!("Username: {}", user.username);
    for (label, value) in [
        ("Email", user.email.clone()),
        ("Phone", user.phone.clone()),
        ("Vehicle", user.vehicle_display()),
        ("Chassis", user.chassis.clone()),
    ] {
        if let Some(value) = value {
            println!("{}: {}", label, value);
        }
    }
}

async fn edit_profile(session: &SessionManager) -> Result<()> {
    let user = require_user(session)?;
    let current = ProfileForm::from_user(&user);

    println!("Press Enter to keep a value.");
    let optional = |label: &str, value: &Option<String>| -> Result<Option<String>> {
        let answer = prompt::with_default(label, value.as_deref().unwrap_or_default())?;
        Ok(Some(answer).filter(|s| !s.is_empty()))
    };

    let form = ProfileForm {
        username: prompt::with_default("Username", &current.username)?,
        email: prompt::with_default("Email", &current.email)?,
        phone: prompt::with_default("Phone", &current.phone)?,
        year: optional("Year", &current.year)?,
        make: optional("Make", &current.make)?,
        model: optional("Model", &current.model)?,
        chassis: optional("Chassis number", &current.chassis)?,
    };
    validate_year(form.year.as_deref()).map_err(|msg| anyhow!(msg))?;

    if form == current {
        println!("Nothing changed.");
        return Ok(());
    }

    session.update_profile(&form).await.map_err(explain)?;
    println!("Profile updated successfully");
    Ok(())
}

async fn diagnose(session: &SessionManager, prompt: String, image: Option<PathBuf>) -> Result<()> {
    require_user(session)?;

    let mut request = DiagnosisRequest::new(prompt);
    if let Some(path) = image {
        request = request.with_image(ImageAttachment::from_path(&path)?);
    }

    println!("Analyzing...");
    let diagnosis = session.diagnose(&request).await.map_err(explain)?;

    println!("\nProblem\n  {}", diagnosis.prompt);
    println!("\nRecommendation\n{}", diagnosis.response);
    Ok(())
}
