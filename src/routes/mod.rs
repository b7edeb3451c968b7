pub mod billing;
pub mod dashboard;
pub mod public;

#[cfg(test)]
pub(crate) fn basic_auth(
    email: &str,
    password: &str,
) -> actix_web_httpauth::headers::authorization::Authorization<
    actix_web_httpauth::headers::authorization::Basic,
> {
    use actix_web_httpauth::headers::authorization::{Authorization, Basic};

    Authorization::from(Basic::new(email.to_string(), Some(password.to_string())))
}
