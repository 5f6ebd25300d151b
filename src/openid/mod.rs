//! OpenID authentication.
//!
//! Steam can act as an OpenID 2.0 authentication provider.
//! This is a fairly old standard, which is why there are barely any libraries
//! for it. The procedure is pretty simple however:
//!
//! 1. build a login URL with [`login_url()`] containing the information that
//!    Steam requires to authenticate a user and send them back to us
//! 2. redirect the user to that URL
//! 3. the user will login as usual
//! 4. the user will be redirected back to the route we originally specified
//! 5. we receive a request with the signed assertion encoded in the query
//!    parameters, which we collect into [`CallbackParameters`]
//! 6. we send the assertion back to Steam ([`Verifier::verify()`]) to verify
//!    that it actually originated from Steam
//! 7. we extract the user's SteamID64 from the assertion

mod login_url;
pub use login_url::{login_url, post_login_redirect, LoginForm};

mod callback;
pub use callback::{CallbackParameters, VerificationOutcome, Verifier};

/// Steam URL to redirect the user to for login.
///
/// This is also the endpoint we post assertions back to for verification.
pub const LOGIN_URL: &str = "https://steamcommunity.com/openid/login";

/// The OpenID 2.0 namespace.
pub const OPENID_NS: &str = "http://specs.openid.net/auth/2.0";

/// Lets the provider pick which identity to assert.
pub const IDENTIFIER_SELECT: &str = "http://specs.openid.net/auth/2.0/identifier_select";

/// The query parameter we inject into `openid.return_to` to remember where the
/// user came from.
pub const RETURN_PARAM: &str = "return";
