//! Login, logout, identity and sign-up.

use std::io::{self, BufRead, IsTerminal, Write};

use anyhow::{Context as _, Result, bail};
use teadopto_core::resources::registration::{self, RegistrationForm};
use teadopto_core::session::GENERIC_LOGIN_MESSAGE;

use super::Context;

pub async fn login(ctx: &Context, username: &str, password: Option<String>) -> Result<()> {
    let password = match password {
        Some(password) => password,
        None => read_password()?,
    };

    let store = ctx.store();
    if !store.login(username, &password).await {
        let message = store
            .error()
            .unwrap_or_else(|| GENERIC_LOGIN_MESSAGE.to_string());
        bail!(message);
    }

    if let Some(user) = store.user() {
        println!("Logged in as {} ({})", user.username, user.role);
    }
    Ok(())
}

fn read_password() -> Result<String> {
    let stdin = io::stdin();
    if stdin.is_terminal() {
        eprint!("Password: ");
        io::stderr().flush().ok();
    }

    let mut line = String::new();
    stdin
        .lock()
        .read_line(&mut line)
        .context("read password from stdin")?;
    let password = line.trim_end_matches(['\r', '\n']);
    if password.is_empty() {
        bail!("Password required: pass --password, set TEADOPTO_PASSWORD or pipe it on stdin.");
    }
    Ok(password.to_string())
}

pub fn logout(ctx: &Context) {
    ctx.store().logout();
    println!("Logged out.");
}

pub fn whoami(ctx: &Context) {
    match ctx.store().user() {
        Some(user) => {
            println!("{} ({})", user.username, user.role);
            if !user.email.is_empty() {
                println!("email: {}", user.email);
            }
            if let Some(phone) = user.phone.as_deref().filter(|p| !p.is_empty()) {
                println!("phone: {phone}");
            }
        }
        None => println!("Not logged in."),
    }
}

pub async fn register(ctx: &Context, form: &RegistrationForm) -> Result<()> {
    match registration::register(ctx.client(), form).await {
        Ok(profile) => {
            println!(
                "Account {} created ({}). Run `teadopto login --username {}` to sign in.",
                profile.username, profile.role, profile.username
            );
            Ok(())
        }
        Err(err) => {
            for (field, message) in &err.field_errors {
                eprintln!("  {field}: {message}");
            }
            bail!(err.summary);
        }
    }
}
