//! Session subcommands: login, signup, logout, status.

use std::io::{self, Write};

use crate::{
    commands::Context,
    views::{LoginForm, SignupForm},
};

#[derive(clap::Subcommand, Debug)]
pub enum AuthAction {
    /// Log in and store the session locally.
    Login {
        #[arg(short, long)]
        username: String,
        #[arg(short, long, env = "INVOICE_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Create an account, then log in with it.
    Signup {
        #[arg(short, long)]
        username: String,
        #[arg(short, long)]
        email: String,
        #[arg(short, long, env = "INVOICE_PASSWORD", hide_env_values = true)]
        password: String,
        /// Repeated password; defaults to --password.
        #[arg(long)]
        confirm: Option<String>,
        #[arg(long)]
        first_name: String,
        #[arg(long)]
        last_name: String,
    },
    /// Forget the local session and revoke the refresh token.
    Logout,
    /// Show who is logged in.
    Status,
}

pub async fn run(action: AuthAction, ctx: &Context) -> anyhow::Result<()> {
    match action {
        AuthAction::Login { username, password } => login(ctx, username, password).await,
        AuthAction::Signup {
            username,
            email,
            password,
            confirm,
            first_name,
            last_name,
        } => {
            let form = SignupForm {
                username,
                email,
                password2: confirm.unwrap_or_else(|| password.clone()),
                password,
                first_name,
                last_name,
            };
            signup(ctx, form).await
        }
        AuthAction::Logout => logout(ctx).await,
        AuthAction::Status => status(ctx).await,
    }
}

async fn login(ctx: &Context, username: String, password: String) -> anyhow::Result<()> {
    let form = LoginForm::new(username, password);
    if let Err(errors) = form.validate() {
        for (_, message) in errors.iter() {
            ctx.notifier.validation(message);
        }
        anyhow::bail!("invalid login input");
    }
    form.submit(&ctx.session).await?;

    let mut out = io::stdout();
    writeln!(out, "Logged in as {}", form.username.trim())?;
    Ok(())
}

async fn signup(ctx: &Context, form: SignupForm) -> anyhow::Result<()> {
    if let Err(errors) = form.validate() {
        for (field, message) in errors.iter() {
            ctx.notifier.validation(format!("{field}: {message}"));
        }
        anyhow::bail!("invalid signup input");
    }
    form.submit(&ctx.session).await?;

    let mut out = io::stdout();
    writeln!(out, "Account created, logged in as {}", form.username.trim())?;
    Ok(())
}

async fn logout(ctx: &Context) -> anyhow::Result<()> {
    if !ctx.session.is_authenticated().await {
        let mut out = io::stdout();
        writeln!(out, "Not logged in")?;
        return Ok(());
    }
    ctx.session.logout().await;
    Ok(())
}

async fn status(ctx: &Context) -> anyhow::Result<()> {
    let mut out = io::stdout();
    writeln!(out, "API: {}", ctx.session.client().base_url())?;
    match ctx.session.user().await {
        Some(user) => {
            writeln!(out, "Logged in as: {}", user.username)?;
            writeln!(out, "Email: {}", user.email)?;
            let name = format!("{} {}", user.first_name, user.last_name);
            if !name.trim().is_empty() {
                writeln!(out, "Name: {}", name.trim())?;
            }
        }
        None => writeln!(out, "Not logged in")?,
    }
    Ok(())
}
