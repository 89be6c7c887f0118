//! Share-link codec.
//!
//! Turns a `(Composition, PlannerConfig)` pair into a compact token safe to
//! embed as a single URL query-parameter value, and back. The token is a
//! versioned JSON envelope with shortened keys, rendered through URL-safe
//! base64 (no padding) so no character needs percent-escaping.
//!
//! Decoding treats its input as untrusted: anything that is not a valid
//! envelope of the current version comes back as a [`ShareError`], never a
//! panic or a partial result.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::models::{Composition, LimitMode, PlannerConfig, ResourceLimits};

/// Version tag embedded in every token. Bumped whenever the envelope's
/// field layout changes; decode rejects every other value.
pub const SHARE_VERSION: u64 = 1;

/// Name of the query parameter carrying the token in a share URL.
pub const QUERY_PARAM: &str = "army";

/// Failures at the codec boundary.
#[derive(Debug, Error)]
pub enum ShareError {
    /// The inputs could not be rendered into the canonical text form.
    #[error("failed to serialize share payload: {0}")]
    Serialization(#[source] serde_json::Error),
    /// The token is not a parseable envelope of any version.
    #[error("malformed share token")]
    MalformedToken,
    /// The envelope parsed but carries a version tag this build does not know.
    #[error("unsupported share token version: {0}")]
    UnsupportedVersion(Value),
}

/// Wire envelope. Keys are shortened to keep tokens small; see the module
/// docs for the layout contract.
#[derive(Debug, Serialize, Deserialize)]
struct Envelope {
    v: u64,
    c: Composition,
    cfg: ConfigRecord,
}

/// The fixed six-field configuration subset captured by the codec.
#[derive(Debug, Serialize, Deserialize)]
struct ConfigRecord {
    mode: LimitMode,
    limits: ResourceLimits,
    total: u32,
    pop: u32,
    age: String,
    civ: String,
}

impl From<&PlannerConfig> for ConfigRecord {
    fn from(config: &PlannerConfig) -> Self {
        Self {
            mode: config.mode,
            limits: config.limits,
            total: config.total_limit,
            pop: config.population_cap,
            age: config.age.clone(),
            civ: config.civilization.clone(),
        }
    }
}

impl From<ConfigRecord> for PlannerConfig {
    fn from(record: ConfigRecord) -> Self {
        Self {
            mode: record.mode,
            limits: record.limits,
            total_limit: record.total,
            population_cap: record.pop,
            age: record.age,
            civilization: record.civ,
        }
    }
}

/// Encode a composition and configuration into an opaque URL-safe token.
///
/// Pure transform; on failure nothing is produced.
pub fn encode(composition: &Composition, config: &PlannerConfig) -> Result<String, ShareError> {
    let envelope = Envelope {
        v: SHARE_VERSION,
        c: composition.clone(),
        cfg: ConfigRecord::from(config),
    };
    let json = serde_json::to_string(&envelope).map_err(ShareError::Serialization)?;
    Ok(URL_SAFE_NO_PAD.encode(json))
}

/// Decode a token previously produced by [`encode`].
///
/// The version tag is inspected before the envelope is deserialized so a
/// token from a future layout fails as [`ShareError::UnsupportedVersion`]
/// rather than as a structural mismatch.
pub fn decode(token: &str) -> Result<(Composition, PlannerConfig), ShareError> {
    let bytes = URL_SAFE_NO_PAD
        .decode(token.trim())
        .map_err(|_| ShareError::MalformedToken)?;
    let value: Value = serde_json::from_slice(&bytes).map_err(|_| ShareError::MalformedToken)?;
    let object = value.as_object().ok_or(ShareError::MalformedToken)?;

    match object.get("v") {
        Some(tag) if tag.as_u64() == Some(SHARE_VERSION) => {}
        Some(tag) => return Err(ShareError::UnsupportedVersion(tag.clone())),
        None => return Err(ShareError::UnsupportedVersion(Value::Null)),
    }

    let envelope: Envelope =
        serde_json::from_value(value).map_err(|_| ShareError::MalformedToken)?;
    Ok((envelope.c, envelope.cfg.into()))
}

/// Build a full share URL by appending the token to a base address.
pub fn share_url(
    base: &str,
    composition: &Composition,
    config: &PlannerConfig,
) -> Result<String, ShareError> {
    let token = encode(composition, config)?;
    let separator = if base.contains('?') { '&' } else { '?' };
    Ok(format!("{base}{separator}{QUERY_PARAM}={token}"))
}

/// Pull the token out of a pasted share URL.
///
/// Accepts a full URL, a bare query string, or the bare token itself;
/// returns `None` when the input carries query pairs but no `army` one.
pub fn token_from_url(input: &str) -> Option<&str> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return None;
    }
    let query = trimmed
        .split_once('?')
        .map(|(_, query)| query)
        .unwrap_or(trimmed);
    let query = query.split('#').next().unwrap_or(query);

    if query.contains('=') {
        return query.split('&').find_map(|pair| {
            pair.split_once('=')
                .filter(|(key, _)| *key == QUERY_PARAM)
                .map(|(_, value)| value)
        });
    }
    Some(query)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Age;

    fn sample_config() -> PlannerConfig {
        PlannerConfig {
            mode: LimitMode::Total,
            limits: ResourceLimits::default(),
            total_limit: 5000,
            population_cap: 200,
            age: Age::Imperial.tag().to_string(),
            civilization: "britons".to_string(),
        }
    }

    fn sample_composition() -> Composition {
        [("archer".to_string(), 10), ("knight".to_string(), 5)]
            .into_iter()
            .collect()
    }

    /// Base64 a raw JSON body the way `encode` would, for crafting hostile
    /// or future-versioned tokens.
    fn raw_token(json: &str) -> String {
        URL_SAFE_NO_PAD.encode(json)
    }

    #[test]
    fn round_trips_composition_and_config() {
        let composition = sample_composition();
        let config = sample_config();

        let token = encode(&composition, &config).unwrap();
        let (decoded_composition, decoded_config) = decode(&token).unwrap();
        assert_eq!(decoded_composition, composition);
        assert_eq!(decoded_config, config);
    }

    #[test]
    fn round_trips_empty_composition() {
        let composition = Composition::new();
        let token = encode(&composition, &sample_config()).unwrap();
        let (decoded, _) = decode(&token).unwrap();
        assert!(decoded.is_empty());
    }

    #[test]
    fn round_trips_individual_mode_limits() {
        let config = PlannerConfig {
            mode: LimitMode::Individual,
            limits: ResourceLimits {
                food: 1000,
                wood: 800,
                gold: 400,
                stone: 0,
            },
            ..sample_config()
        };
        let token = encode(&sample_composition(), &config).unwrap();
        let (_, decoded) = decode(&token).unwrap();
        assert_eq!(decoded, config);
    }

    #[test]
    fn unknown_age_tag_passes_through() {
        let config = PlannerConfig {
            age: "space".to_string(),
            ..sample_config()
        };
        let token = encode(&sample_composition(), &config).unwrap();
        let (_, decoded) = decode(&token).unwrap();
        assert_eq!(decoded.age, "space");
        assert_eq!(decoded.age_known(), None);
    }

    #[test]
    fn token_is_url_safe() {
        let token = encode(&sample_composition(), &sample_config()).unwrap();
        assert!(token
            .chars()
            .all(|ch| ch.is_ascii_alphanumeric() || ch == '-' || ch == '_'));
    }

    #[test]
    fn wire_layout_uses_short_keys() {
        let token = encode(&sample_composition(), &sample_config()).unwrap();
        let bytes = URL_SAFE_NO_PAD.decode(&token).unwrap();
        let value: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(value["v"], 1);
        assert_eq!(value["c"]["archer"], 10);
        assert_eq!(value["cfg"]["mode"], "total");
        assert_eq!(value["cfg"]["limits"]["stone"], 0);
        assert_eq!(value["cfg"]["total"], 5000);
        assert_eq!(value["cfg"]["pop"], 200);
        assert_eq!(value["cfg"]["age"], "imperial");
        assert_eq!(value["cfg"]["civ"], "britons");
    }

    #[test]
    fn rejects_future_version() {
        let token = raw_token(
            r#"{"v":2,"c":{},"cfg":{"mode":"total","limits":{"food":0,"wood":0,"gold":0,"stone":0},"total":0,"pop":200,"age":"imperial","civ":"britons"}}"#,
        );
        assert!(matches!(
            decode(&token),
            Err(ShareError::UnsupportedVersion(_))
        ));
    }

    #[test]
    fn rejects_version_zero_absent_and_non_numeric() {
        for body in [
            r#"{"v":0,"c":{},"cfg":{}}"#,
            r#"{"c":{},"cfg":{}}"#,
            r#"{"v":"one","c":{},"cfg":{}}"#,
        ] {
            assert!(matches!(
                decode(&raw_token(body)),
                Err(ShareError::UnsupportedVersion(_))
            ));
        }
    }

    #[test]
    fn rejects_malformed_input() {
        for input in [
            "",
            "not-a-real-token",
            "!!!%%%",
            &raw_token("{\"v\":1")[..],
            &raw_token("[1,2,3]")[..],
            // Valid JSON of the right version but missing `cfg`.
            &raw_token(r#"{"v":1,"c":{}}"#)[..],
        ] {
            assert!(
                matches!(decode(input), Err(ShareError::MalformedToken)),
                "expected malformed for {input:?}"
            );
        }
    }

    #[test]
    fn decode_failure_is_idempotent() {
        let first = decode("not-a-real-token").unwrap_err();
        let second = decode("not-a-real-token").unwrap_err();
        assert_eq!(
            std::mem::discriminant(&first),
            std::mem::discriminant(&second)
        );
    }

    #[test]
    fn share_url_appends_query_parameter() {
        let url = share_url(
            "https://armytui.app/planner",
            &sample_composition(),
            &sample_config(),
        )
        .unwrap();
        assert!(url.starts_with("https://armytui.app/planner?army="));

        let with_query = share_url(
            "https://armytui.app/planner?lang=en",
            &sample_composition(),
            &sample_config(),
        )
        .unwrap();
        assert!(with_query.contains("lang=en&army="));
    }

    #[test]
    fn token_from_url_handles_urls_and_bare_tokens() {
        let url = share_url("https://armytui.app/planner", &Composition::new(), &sample_config())
            .unwrap();
        let token = token_from_url(&url).unwrap();
        assert!(decode(token).is_ok());

        assert_eq!(token_from_url("abc123"), Some("abc123"));
        assert_eq!(token_from_url("  abc123  "), Some("abc123"));
        assert_eq!(token_from_url("army=xyz"), Some("xyz"));
        assert_eq!(token_from_url("https://x/planner?army=xyz#frag"), Some("xyz"));
        assert_eq!(token_from_url("https://x/planner?lang=en"), None);
        assert_eq!(token_from_url(""), None);
    }

    #[test]
    fn url_round_trip_reproduces_plan() {
        let composition = sample_composition();
        let config = sample_config();
        let url = share_url("https://armytui.app/planner", &composition, &config).unwrap();
        let token = token_from_url(&url).unwrap();
        let (decoded_composition, decoded_config) = decode(token).unwrap();
        assert_eq!(decoded_composition, composition);
        assert_eq!(decoded_config, config);
    }
}
