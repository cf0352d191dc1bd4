//! Query and form parameter extraction.

use std::collections::BTreeMap;

use url::form_urlencoded;

use super::body::CapturedBody;

/// Request parameters by name; a repeated name keeps its last value.
pub type Params = BTreeMap<String, String>;

/// Media type whose body carries parameters.
const FORM_MEDIA_TYPE: &str = "application/x-www-form-urlencoded";

/// Build the parameter map from the query string and, for form posts, the
/// captured body.
///
/// The map starts empty: route path parameters are deliberately not part of
/// it, so a path segment can never shadow or be shadowed by a query or body
/// parameter of the same name. Body parameters override query parameters.
#[must_use]
pub fn extract_params(
    query: Option<&str>,
    content_type: Option<&str>,
    body: &CapturedBody,
) -> Params {
    let mut params = Params::new();

    if let Some(query) = query {
        params.extend(form_urlencoded::parse(query.as_bytes()).into_owned());
    }

    if content_type.is_some_and(is_form) {
        params.extend(form_urlencoded::parse(body.view()).into_owned());
    }

    params
}

fn is_form(content_type: &str) -> bool {
    content_type
        .split(';')
        .next()
        .is_some_and(|media| media.trim().eq_ignore_ascii_case(FORM_MEDIA_TYPE))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::request::body::declared_encoding;

    fn body(s: &'static str) -> CapturedBody {
        CapturedBody::new(s)
    }

    #[test]
    fn query_parameters_are_decoded() {
        let params = extract_params(
            Some("environment=production&fail_on_404=true&name=a+b%2Fc"),
            None,
            &body(""),
        );
        assert_eq!(params["environment"], "production");
        assert_eq!(params["fail_on_404"], "true");
        assert_eq!(params["name"], "a b/c");
    }

    #[test]
    fn form_body_is_merged_over_query() {
        let params = extract_params(
            Some("environment=production&transaction_uuid=1"),
            Some("application/x-www-form-urlencoded; charset=UTF-8"),
            &body("environment=staging&facts_format=json"),
        );
        assert_eq!(params["environment"], "staging");
        assert_eq!(params["transaction_uuid"], "1");
        assert_eq!(params["facts_format"], "json");
    }

    #[test]
    fn non_form_body_is_not_parsed() {
        let params = extract_params(
            None,
            Some("application/json"),
            &body("environment=staging"),
        );
        assert!(params.is_empty());
    }

    #[test]
    fn latin1_form_matches_decoded_body() {
        // GIVEN: a form body declared as ISO-8859-1 with a non-ASCII byte
        let content_type = "application/x-www-form-urlencoded; charset=iso-8859-1";
        let captured =
            CapturedBody::decode(b"name=caf\xE9", declared_encoding(Some(content_type)));

        // WHEN: extracting params from it
        let params = extract_params(None, Some(content_type), &captured);

        // THEN: the param agrees with the forwarded body text
        assert_eq!(captured.text(), "name=caf\u{e9}");
        assert_eq!(params["name"], "caf\u{e9}");
    }

    #[test]
    fn repeated_name_keeps_last_value() {
        let params = extract_params(Some("tag=a&tag=b"), None, &body(""));
        assert_eq!(params["tag"], "b");
    }

    #[test]
    fn body_remains_available_after_extraction() {
        let captured = body("a=1&b=2");
        let first = extract_params(None, Some(FORM_MEDIA_TYPE), &captured);
        let second = extract_params(None, Some(FORM_MEDIA_TYPE), &captured);
        assert_eq!(first, second);
        assert_eq!(captured.text(), "a=1&b=2");
    }
}
