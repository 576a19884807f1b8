use once_cell::sync::Lazy;
use regex::Regex;

static SENSITIVE_LITERAL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)\b(PASSWORD|PRIVATE_KEY|PRIVATE_KEY_PASSPHRASE|TOKEN|RSA_PUBLIC_KEY|RSA_PUBLIC_KEY_2|SECRET|CLIENT_SECRET|OAUTH_CLIENT_SECRET|AWS_SECRET_KEY|AZURE_SAS_TOKEN|MASTER_KEY)(\s*=\s*)'(?:[^']|'')*'",
    )
    .expect("sensitive literal pattern is valid")
});

/// Replace the values of credential-bearing parameters with `***` before logging.
pub fn mask_sensitive(sql: &str) -> String {
    SENSITIVE_LITERAL
        .replace_all(sql, "$1$2'***'")
        .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn passwords_and_keys_are_masked() {
        let sql = r#"CREATE USER "u" PASSWORD = 'hunter''2' RSA_PUBLIC_KEY = 'MIIB' COMMENT = 'keep me' MUST_CHANGE_PASSWORD = true"#;
        assert_eq!(
            mask_sensitive(sql),
            r#"CREATE USER "u" PASSWORD = '***' RSA_PUBLIC_KEY = '***' COMMENT = 'keep me' MUST_CHANGE_PASSWORD = true"#
        );
    }

    #[test]
    fn other_statements_are_untouched() {
        let sql = r#"SHOW DATABASES LIKE 'password'"#;
        assert_eq!(mask_sensitive(sql), sql);
    }
}
