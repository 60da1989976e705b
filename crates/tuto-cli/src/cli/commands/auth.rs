//! Auth command handlers.

use std::io::{self, BufRead, Write};

use anyhow::Result;
use tuto_core::routing::{RouteTree, select_route};
use tuto_core::session::{RegistrationForm, Session};
use tuto_core::validation;

pub struct RegisterArgs {
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub password: String,
    pub class_cycle: String,
    pub class_level: String,
    pub series: Option<String>,
}

fn prompt(label: &str) -> Result<String> {
    print!("{label}");
    io::stdout().flush()?;

    let mut input = String::new();
    io::stdin().lock().read_line(&mut input)?;
    Ok(input.trim().to_string())
}

fn or_prompt(value: Option<String>, label: &str) -> Result<String> {
    match value {
        Some(value) => Ok(value),
        None => prompt(label),
    }
}

/// Prints the field errors as an inline banner and fails.
fn reject_invalid(result: &validation::ValidationResult) -> Result<()> {
    if result.is_valid() {
        return Ok(());
    }
    for (field, message) in &result.errors {
        eprintln!("  {field}: {message}");
    }
    anyhow::bail!("Formulaire invalide")
}

pub async fn login(
    session: &mut Session,
    username: Option<String>,
    password: Option<String>,
) -> Result<()> {
    let username = or_prompt(username, "Nom d'utilisateur: ")?;
    let password = or_prompt(password, "Mot de passe: ")?;

    reject_invalid(&validation::validate_login_form(&username, &password))?;

    if session.login(&username, &password).await.is_err() {
        let message = session
            .state()
            .error
            .clone()
            .unwrap_or_else(|| "Connexion échouée".to_string());
        anyhow::bail!("{message}");
    }

    let state = session.state();
    if let Some(user) = &state.user {
        println!("✓ Connecté en tant que {}", user.name);
    }
    println!("  Écran au démarrage: {}", route_label(select_route(state)));
    Ok(())
}

pub fn logout(session: &mut Session) -> Result<()> {
    session.logout();
    println!("✓ Déconnecté (jetons supprimés).");
    Ok(())
}

pub async fn register(session: &mut Session, args: RegisterArgs) -> Result<()> {
    reject_invalid(&validation::validate_register_form(
        &args.first_name,
        &args.last_name,
        &args.email,
        &args.password,
        &args.password,
        Some(&args.class_cycle),
        Some(&args.class_level),
        args.series.as_deref(),
    ))?;

    let form = RegistrationForm {
        username: args.username,
        email: args.email,
        first_name: args.first_name,
        last_name: args.last_name,
        password: args.password,
        class_cycle: Some(args.class_cycle),
        class_level: Some(args.class_level),
        series: args.series,
        teaching_cycle: None,
    };

    if session.register(&form).await.is_err() {
        let message = session
            .state()
            .error
            .clone()
            .unwrap_or_else(|| "Inscription échouée".to_string());
        anyhow::bail!("{message}");
    }

    // Registration never authenticates; the login flow is the next step.
    println!("✓ Compte créé. Connectez-vous avec `tuto login`.");
    Ok(())
}

pub async fn whoami(session: &mut Session) -> Result<()> {
    session.rehydrate().await;

    let state = session.state();
    match &state.user {
        Some(user) => {
            println!("Utilisateur: {} ({})", user.name, user.username);
            println!("Identifiant: {}", user.id);
            if let Some(sp) = &user.student_profile {
                println!("Classe: {}", sp.class_level.as_deref().unwrap_or("-"));
                println!(
                    "Diagnostic: {}",
                    if sp.diagnostic_completed {
                        "terminé"
                    } else {
                        "à faire"
                    }
                );
            }
        }
        None => println!("Aucune session active."),
    }

    println!("Écran au démarrage: {}", route_label(select_route(state)));
    Ok(())
}

pub async fn change_password(
    session: &mut Session,
    current: Option<String>,
    new: Option<String>,
) -> Result<()> {
    session.rehydrate().await;
    if !session.state().is_authenticated {
        anyhow::bail!("Aucune session active. Connectez-vous avec `tuto login`.");
    }

    let current = or_prompt(current, "Mot de passe actuel: ")?;
    let new = or_prompt(new, "Nouveau mot de passe: ")?;

    if let Some(message) = validation::validate_password(&new) {
        anyhow::bail!("{message}");
    }

    if session.change_password(&current, &new).await.is_err() {
        let message = session
            .state()
            .error
            .clone()
            .unwrap_or_else(|| "Changement de mot de passe échoué".to_string());
        anyhow::bail!("{message}");
    }

    println!("✓ Mot de passe mis à jour.");
    Ok(())
}

fn route_label(route: RouteTree) -> &'static str {
    match route {
        RouteTree::Splash => "(chargement)",
        RouteTree::Auth => "Connexion",
        RouteTree::Evaluation => "Évaluation diagnostique",
        RouteTree::Main => "Application",
    }
}
