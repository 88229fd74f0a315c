use painel_common::models::{Credentials, OAuthCallbackQuery};
use painel_core::{ConsoleHandle, Error};

pub fn handle_login(args: &[&str], console: &ConsoleHandle) -> Result<Option<String>, Error> {
    if args.len() < 2 {
        return Ok(Some("Uso: login <email> <senha>".to_string()));
    }
    console.login(Credentials::new(args[0], args[1]))?;
    Ok(Some("Autenticando...".to_string()))
}

pub fn handle_token(args: &[&str], console: &ConsoleHandle) -> Result<Option<String>, Error> {
    match args.first() {
        Some(token) => {
            console.login_with_token(*token)?;
            Ok(None)
        }
        None => Ok(Some("Uso: token <access_token>".to_string())),
    }
}

pub fn handle_callback(args: &[&str], console: &ConsoleHandle) -> Result<Option<String>, Error> {
    if args.is_empty() {
        return Ok(Some("Uso: callback <query>".to_string()));
    }
    console.oauth_callback(parse_callback_query(&args.join("")))?;
    Ok(None)
}

/// Accepts a bare query (`token=abc`), a leading `?`, or a whole callback URL.
/// Values are percent-decoded once here; the console decodes the error again.
pub fn parse_callback_query(raw: &str) -> OAuthCallbackQuery {
    let raw = raw.trim();
    let query = match raw.split_once('?') {
        Some((_, q)) => q,
        None => raw,
    };
    let mut out = OAuthCallbackQuery::default();
    for (key, value) in url::form_urlencoded::parse(query.as_bytes()) {
        match key.as_ref() {
            "token" => out.token = Some(value.into_owned()),
            "error" => out.error = Some(value.into_owned()),
            _ => {}
        }
    }
    out
}
