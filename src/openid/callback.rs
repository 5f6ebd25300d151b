use std::collections::BTreeMap;

use lazy_regex::{regex_captures, regex_is_match};
use reqwest::{header, Response};
use url::Url;

use super::{LOGIN_URL, OPENID_NS, RETURN_PARAM};

/// The fields that must be present on every genuine callback.
const REQUIRED_FIELDS: [&str; 4] = ["assoc_handle", "claimed_id", "sig", "signed"];

/// Parameters Steam sends along when redirecting a user back to us.
///
/// Keys are stored without their `openid.` prefix. Both the dotted form Steam
/// actually sends (`openid.claimed_id`) and the underscored form some HTTP
/// stacks mangle it into (`openid_claimed_id`) are accepted.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct CallbackParameters {
	/// Every `openid.*` field, keyed by the part after the prefix.
	fields: BTreeMap<String, String>,

	/// The `return` parameter injected by [`login_url()`].
	///
	/// [`login_url()`]: super::login_url
	return_target: Option<String>,
}

/// The result of asking Steam whether an assertion is genuine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VerificationOutcome {
	/// Steam confirmed the assertion; this is the asserted SteamID64.
	Valid(String),

	/// The assertion was rejected, malformed, or could not be checked.
	Invalid,
}

impl CallbackParameters {
	/// Collects callback parameters from raw key-value pairs, e.g. a parsed
	/// query string.
	///
	/// Unrelated keys are ignored.
	pub fn from_pairs<I, K, V>(pairs: I) -> Self
	where
		I: IntoIterator<Item = (K, V)>,
		K: AsRef<str>,
		V: Into<String>,
	{
		let mut params = Self::default();

		for (key, value) in pairs {
			let key = key.as_ref();

			if key == RETURN_PARAM {
				params.return_target = Some(value.into());
				continue;
			}

			let Some(field) = key
				.strip_prefix("openid.")
				.or_else(|| key.strip_prefix("openid_"))
			else {
				continue;
			};

			params.fields.insert(field.to_owned(), value.into());
		}

		params
	}

	/// Parses callback parameters from a URL-encoded query string.
	pub fn from_query(query: &str) -> Self {
		Self::from_pairs(url::form_urlencoded::parse(query.as_bytes()).into_owned())
	}

	/// Returns the value of the `openid.<name>` field.
	///
	/// Dotted names such as `ns.sreg` also match their underscored form.
	pub fn get(&self, name: &str) -> Option<&str> {
		self.fields
			.get(name)
			.or_else(|| self.fields.get(&name.replace('.', "_")))
			.map(String::as_str)
	}

	/// The `return` parameter, if any.
	pub fn return_target(&self) -> Option<&str> {
		self.return_target.as_deref()
	}

	/// Checks that every field required for verification is present.
	///
	/// If this returns `false` the request cannot have come from Steam and
	/// there is no point in asking Steam about it.
	pub fn is_structurally_valid(&self) -> bool {
		REQUIRED_FIELDS
			.iter()
			.all(|field| self.get(field).is_some())
	}

	/// Extracts the SteamID64 embedded in `openid.claimed_id`.
	pub fn claimed_steam_id(&self) -> Option<&str> {
		let claimed_id = self.get("claimed_id")?;
		let (_, steam_id) =
			regex_captures!(r"^https://steamcommunity\.com/openid/id/(\d{17,25})", claimed_id)?;

		Some(steam_id)
	}

	/// Builds the form Steam expects for a `check_authentication` request.
	///
	/// Every field listed in `openid.signed` is copied over, followed by the
	/// association handle, signature and namespace. `openid.mode` is always
	/// overridden.
	fn verification_form(&self, unescape_slashes: bool) -> BTreeMap<String, String> {
		let mut form = BTreeMap::new();
		let signed = self.get("signed").unwrap_or_default();

		for field in signed.split(',').filter(|field| !field.is_empty()) {
			let Some(value) = self.get(field) else {
				tracing::debug!(field, "signed field missing from callback");
				continue;
			};

			let value = if unescape_slashes {
				strip_slashes(value)
			} else {
				value.to_owned()
			};

			form.insert(format!("openid.{field}"), value);
		}

		for field in ["assoc_handle", "signed", "sig"] {
			if let Some(value) = self.get(field) {
				form.insert(format!("openid.{field}"), value.to_owned());
			}
		}

		form.insert(String::from("openid.ns"), String::from(OPENID_NS));
		form.insert(String::from("openid.mode"), String::from("check_authentication"));

		form
	}
}

/// Undoes backslash-escaping applied by legacy transport layers.
fn strip_slashes(value: &str) -> String {
	let mut unescaped = String::with_capacity(value.len());
	let mut chars = value.chars();

	while let Some(ch) = chars.next() {
		if ch != '\\' {
			unescaped.push(ch);
			continue;
		}

		match chars.next() {
			Some('0') => unescaped.push('\0'),
			Some(escaped) => unescaped.push(escaped),
			None => {}
		}
	}

	unescaped
}

/// Sends assertions back to Steam to check that they are genuine.
#[derive(Debug, Clone)]
pub struct Verifier {
	/// Client used for the verification request.
	http_client: reqwest::Client,

	/// The OpenID endpoint to post assertions to.
	provider_url: Url,

	/// Whether to undo legacy backslash-escaping on signed values.
	unescape_slashes: bool,
}

impl Verifier {
	/// Creates a new [`Verifier`] that talks to Steam.
	pub fn new(http_client: reqwest::Client) -> Self {
		Self {
			http_client,
			provider_url: Url::parse(LOGIN_URL).expect("hard-coded URL should be valid"),
			unescape_slashes: false,
		}
	}

	/// Posts assertions to `provider_url` instead of Steam.
	pub fn with_provider_url(self, provider_url: Url) -> Self {
		Self { provider_url, ..self }
	}

	/// Enables or disables undoing legacy backslash-escaping.
	pub fn with_unescape_slashes(self, unescape_slashes: bool) -> Self {
		Self { unescape_slashes, ..self }
	}

	/// Asks Steam whether the assertion in `params` is genuine.
	///
	/// Transport errors are indistinguishable from a rejected assertion; both
	/// result in [`VerificationOutcome::Invalid`].
	#[tracing::instrument(
		level = "debug",
		name = "Verifier::verify",
		skip_all,
		fields(claimed_id = params.get("claimed_id")),
		ret,
	)]
	pub async fn verify(&self, params: &CallbackParameters) -> VerificationOutcome {
		if !params.is_structurally_valid() {
			tracing::debug!("callback is missing required fields");
			return VerificationOutcome::Invalid;
		}

		let form = params.verification_form(self.unescape_slashes);

		let response = match self.check_authentication(&form).await {
			Ok(response) => response,
			Err(error) => {
				tracing::warn!(%error, "failed to verify assertion with steam");
				return VerificationOutcome::Invalid;
			}
		};

		let Some(steam_id) = params.claimed_steam_id() else {
			tracing::debug!("claimed_id does not contain a SteamID");
			return VerificationOutcome::Invalid;
		};

		if !regex_is_match!(r"is_valid\s*:\s*true"i, &response) {
			tracing::debug!(%response, "steam login invalid");
			return VerificationOutcome::Invalid;
		}

		if !steam_id.bytes().all(|byte| byte.is_ascii_digit()) {
			return VerificationOutcome::Invalid;
		}

		tracing::debug!(steam_id, "user logged in");

		VerificationOutcome::Valid(steam_id.to_owned())
	}

	/// Makes the `check_authentication` request and returns the response body.
	async fn check_authentication(
		&self,
		form: &BTreeMap<String, String>,
	) -> reqwest::Result<String> {
		self.http_client
			.post(self.provider_url.clone())
			.header(header::ACCEPT_LANGUAGE, "en")
			.form(form)
			.send()
			.await
			.and_then(Response::error_for_status)?
			.text()
			.await
	}
}

#[cfg(test)]
mod tests {
	use color_eyre::Result;
	use wiremock::matchers::{body_string_contains, header, method, path};
	use wiremock::{Mock, MockServer, ResponseTemplate};

	use super::*;

	const STEAM_ID: &str = "76561197960287930";

	const VALID_BODY: &str = "ns:http://specs.openid.net/auth/2.0\nis_valid:true\n";
	const INVALID_BODY: &str = "ns:http://specs.openid.net/auth/2.0\nis_valid:false\n";

	fn callback(claimed_id: &str) -> CallbackParameters {
		CallbackParameters::from_pairs([
			("openid.ns", OPENID_NS),
			("openid.mode", "id_res"),
			("openid.op_endpoint", LOGIN_URL),
			("openid.claimed_id", claimed_id),
			("openid.identity", claimed_id),
			("openid.return_to", "https://example.com/auth/steam/callback"),
			("openid.response_nonce", "2024-01-01T00:00:00ZaBcDeF"),
			("openid.assoc_handle", "1234567890"),
			(
				"openid.signed",
				"signed,op_endpoint,claimed_id,identity,return_to,response_nonce,assoc_handle",
			),
			("openid.sig", "W0u5DRbtHE1GG0ZKXjerUZDUGmc="),
			("return", "https://example.com/"),
		])
	}

	fn genuine_callback() -> CallbackParameters {
		callback(&format!("https://steamcommunity.com/openid/id/{STEAM_ID}"))
	}

	async fn steam(body: &str) -> (MockServer, Verifier) {
		let server = MockServer::start().await;

		Mock::given(method("POST"))
			.and(path("/openid/login"))
			.and(header("content-type", "application/x-www-form-urlencoded"))
			.and(body_string_contains("openid.mode=check_authentication"))
			.respond_with(ResponseTemplate::new(200).set_body_string(body))
			.mount(&server)
			.await;

		let provider_url = Url::parse(&format!("{}/openid/login", server.uri()))
			.expect("mock server URI should be valid");

		let verifier = Verifier::new(reqwest::Client::new()).with_provider_url(provider_url);

		(server, verifier)
	}

	#[test]
	fn structural_validity_requires_all_fields() {
		let full = genuine_callback();

		assert!(full.is_structurally_valid());

		for missing in REQUIRED_FIELDS {
			let pairs = [
				("openid.assoc_handle", "1"),
				("openid.claimed_id", "2"),
				("openid.sig", "3"),
				("openid.signed", "4"),
			]
			.into_iter()
			.filter(|(key, _)| *key != format!("openid.{missing}"));

			assert!(
				!CallbackParameters::from_pairs(pairs).is_structurally_valid(),
				"should be invalid without `{missing}`"
			);
		}
	}

	#[test]
	fn accepts_mangled_keys() {
		let params = CallbackParameters::from_pairs([
			("openid_assoc_handle", "1"),
			("openid_claimed_id", "2"),
			("openid_sig", "3"),
			("openid_signed", "4"),
			("unrelated", "5"),
		]);

		assert!(params.is_structurally_valid());
		assert_eq!(params.get("sig"), Some("3"));
		assert_eq!(params.get("unrelated"), None);
	}

	#[test]
	fn parses_query_strings() {
		let params = CallbackParameters::from_query(
			"openid.claimed_id=https%3A%2F%2Fsteamcommunity.com%2Fopenid%2Fid%2F76561197960287930\
			 &return=https%3A%2F%2Fexample.com%2Fmaps",
		);

		assert_eq!(params.claimed_steam_id(), Some(STEAM_ID));
		assert_eq!(params.return_target(), Some("https://example.com/maps"));
	}

	#[test]
	fn verification_form_overrides_mode() {
		let form = genuine_callback().verification_form(false);

		assert_eq!(form["openid.mode"], "check_authentication");
		assert_eq!(form["openid.ns"], OPENID_NS);
		assert_eq!(form["openid.sig"], "W0u5DRbtHE1GG0ZKXjerUZDUGmc=");
		assert_eq!(form["openid.response_nonce"], "2024-01-01T00:00:00ZaBcDeF");
		assert!(!form.contains_key("return"));
		assert!(!form.keys().any(|key| key.contains("return=")));
	}

	#[test]
	fn strips_legacy_slashes() {
		assert_eq!(strip_slashes(r#"it\'s a \"test\" \\ ok"#), r#"it's a "test" \ ok"#);

		let params = CallbackParameters::from_pairs([
			("openid.signed", "response_nonce"),
			("openid.response_nonce", r"abc\'def"),
		]);

		assert_eq!(params.verification_form(true)["openid.response_nonce"], "abc'def");
		assert_eq!(params.verification_form(false)["openid.response_nonce"], r"abc\'def");
	}

	#[tokio::test]
	async fn genuine_assertion_is_valid() -> Result<()> {
		let (_server, verifier) = steam(VALID_BODY).await;
		let outcome = verifier.verify(&genuine_callback()).await;

		assert_eq!(outcome, VerificationOutcome::Valid(String::from(STEAM_ID)));

		Ok(())
	}

	#[tokio::test]
	async fn echoes_signed_fields_back_to_steam() -> Result<()> {
		let server = MockServer::start().await;
		let mut mock = Mock::given(method("POST"))
			.and(path("/openid/login"))
			.and(header("content-type", "application/x-www-form-urlencoded"));

		for field in [
			"openid.mode=check_authentication",
			"openid.ns=http%3A%2F%2Fspecs.openid.net%2Fauth%2F2.0",
			"openid.sig=W0u5DRbtHE1GG0ZKXjerUZDUGmc%3D",
			"openid.assoc_handle=1234567890",
			"openid.signed=signed%2Cop_endpoint%2Cclaimed_id%2Cidentity%2Creturn_to%2Cresponse_nonce%2Cassoc_handle",
			"openid.op_endpoint=https%3A%2F%2Fsteamcommunity.com%2Fopenid%2Flogin",
			"openid.claimed_id=https%3A%2F%2Fsteamcommunity.com%2Fopenid%2Fid%2F76561197960287930",
			"openid.identity=https%3A%2F%2Fsteamcommunity.com%2Fopenid%2Fid%2F76561197960287930",
			"openid.return_to=https%3A%2F%2Fexample.com%2Fauth%2Fsteam%2Fcallback",
			"openid.response_nonce=2024-01-01T00%3A00%3A00ZaBcDeF",
		] {
			mock = mock.and(body_string_contains(field));
		}

		mock.respond_with(ResponseTemplate::new(200).set_body_string(VALID_BODY))
			.expect(1)
			.mount(&server)
			.await;

		let verifier = Verifier::new(reqwest::Client::new())
			.with_provider_url(format!("{}/openid/login", server.uri()).parse()?);
		let outcome = verifier.verify(&genuine_callback()).await;

		assert_eq!(outcome, VerificationOutcome::Valid(String::from(STEAM_ID)));

		let requests = server.received_requests().await.unwrap_or_default();
		let body = requests
			.first()
			.map(|request| String::from_utf8_lossy(&request.body).into_owned())
			.unwrap_or_default();

		assert!(!body.contains("id_res"), "{body}");
		assert!(!body.split('&').any(|pair| pair.starts_with("return=")), "{body}");

		Ok(())
	}

	#[tokio::test]
	async fn validity_marker_is_case_and_space_insensitive() -> Result<()> {
		let (_server, verifier) =
			steam("ns:http://specs.openid.net/auth/2.0\nIS_VALID : True\n").await;
		let outcome = verifier.verify(&genuine_callback()).await;

		assert_eq!(outcome, VerificationOutcome::Valid(String::from(STEAM_ID)));

		Ok(())
	}

	#[tokio::test]
	async fn rejected_assertion_is_invalid() -> Result<()> {
		let (_server, verifier) = steam(INVALID_BODY).await;
		let outcome = verifier.verify(&genuine_callback()).await;

		assert_eq!(outcome, VerificationOutcome::Invalid);

		Ok(())
	}

	#[tokio::test]
	async fn foreign_claimed_id_is_invalid() -> Result<()> {
		let (_server, verifier) = steam(VALID_BODY).await;

		for claimed_id in [
			"https://example.com/openid/id/76561197960287930",
			"https://steamcommunity.com/openid/id/1234",
			"https://steamcommunity.com/openid/id/",
		] {
			let outcome = verifier.verify(&callback(claimed_id)).await;

			assert_eq!(outcome, VerificationOutcome::Invalid, "{claimed_id}");
		}

		Ok(())
	}

	#[tokio::test]
	async fn incomplete_callback_never_reaches_steam() -> Result<()> {
		let (server, verifier) = steam(VALID_BODY).await;
		let params = CallbackParameters::from_pairs([
			("openid.claimed_id", "https://steamcommunity.com/openid/id/76561197960287930"),
			("openid.assoc_handle", "1234567890"),
			("openid.signed", "claimed_id"),
		]);

		assert_eq!(verifier.verify(&params).await, VerificationOutcome::Invalid);

		let requests = server.received_requests().await.unwrap_or_default();

		assert!(requests.is_empty(), "no request should have been made");

		Ok(())
	}

	#[tokio::test]
	async fn server_errors_are_invalid() -> Result<()> {
		let server = MockServer::start().await;

		Mock::given(method("POST"))
			.respond_with(ResponseTemplate::new(503).set_body_string(VALID_BODY))
			.mount(&server)
			.await;

		let verifier =
			Verifier::new(reqwest::Client::new()).with_provider_url(server.uri().parse()?);

		assert_eq!(verifier.verify(&genuine_callback()).await, VerificationOutcome::Invalid);

		Ok(())
	}

	#[tokio::test]
	async fn unreachable_provider_is_invalid() -> Result<()> {
		let verifier = Verifier::new(reqwest::Client::new())
			.with_provider_url(Url::parse("http://127.0.0.1:1/openid/login")?);

		assert_eq!(verifier.verify(&genuine_callback()).await, VerificationOutcome::Invalid);

		Ok(())
	}
}
