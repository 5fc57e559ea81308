//! Secret redaction for subprocess output.
//!
//! Anything a system tool prints may end up in a log line, an audit
//! `details` field, or an HTTP response. `sanitize_output` runs before any
//! of those.

use std::sync::LazyLock;

use regex::Regex;

static PASSWORD_KV: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"password=[^\s]+").expect("password pattern"));
static TOKEN_KV: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"token=[^\s]+").expect("token pattern"));
static KEY_KV: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"key=[^\s]+").expect("key pattern"));

/// Strip `password=`, `token=`, and `key=` values from text.
///
/// The key itself is kept so operators can see that a credential was
/// present; only the value is masked.
pub fn sanitize_output(output: &str) -> String {
    let output = PASSWORD_KV.replace_all(output, "password=***");
    let output = TOKEN_KV.replace_all(&output, "token=***");
    let output = KEY_KV.replace_all(&output, "key=***");
    output.into_owned()
}
