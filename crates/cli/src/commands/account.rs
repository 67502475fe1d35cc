//! Login, logout and account commands.

use std::io::BufRead;

use boutique_storefront::Storefront;
use boutique_storefront::api::ProfileUpdate;
use boutique_storefront::auth::{AuthError, Credentials, Registration};
use tracing::info;

use super::AccountAction;
use crate::CliError;
use crate::output;

/// Log in and report what happened to the anonymous cart.
pub async fn login(
    shop: &mut Storefront,
    email: &str,
    password: Option<String>,
) -> Result<(), CliError> {
    let password = match password {
        Some(password) => password,
        None => read_password()?,
    };
    let credentials =
        Credentials::new(email, password).map_err(boutique_storefront::Error::from)?;

    let outcome = shop.login(&credentials).await?;
    output::welcome(&outcome.session.profile);
    output::reconcile(&outcome.reconcile);
    Ok(())
}

pub async fn logout(shop: &mut Storefront) {
    let was_authenticated = shop.is_authenticated();
    shop.logout().await;
    if was_authenticated {
        output::line("Logged out.");
    } else {
        output::line("Not logged in.");
    }
}

pub fn whoami(shop: &Storefront) {
    match shop.session() {
        Some(session) => output::profile(&session.profile),
        None => output::line("Not logged in."),
    }
}

pub async fn run(shop: &mut Storefront, action: AccountAction) -> Result<(), CliError> {
    match action {
        AccountAction::Register {
            email,
            password,
            first_name,
            last_name,
            address,
        } => {
            let password = match password {
                Some(password) => password,
                None => read_password()?,
            };
            let mut registration = Registration::new(&email, password, &first_name, &last_name)?;
            if let Some(address) = address {
                registration = registration.with_address(address);
            }
            shop.auth().register(&registration).await?;
            info!(email = %email, "Registered");
            output::line("Account created. Log in with `boutique login`.");
        }
        AccountAction::Update {
            first_name,
            last_name,
            address,
        } => {
            let update = ProfileUpdate {
                first_name,
                last_name,
                address,
            };
            let profile = shop.auth_mut().update_profile(&update).await?;
            output::profile(&profile);
        }
    }
    Ok(())
}

/// Read one line from stdin as the password.
fn read_password() -> Result<String, CliError> {
    let mut line = String::new();
    std::io::stdin().lock().read_line(&mut line)?;
    let password = line.trim_end_matches(['\r', '\n']).to_string();
    if password.is_empty() {
        return Err(boutique_storefront::Error::from(AuthError::MissingPassword).into());
    }
    Ok(password)
}
