// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Unit tests for `novarc.rs`

#[cfg(test)]
mod tests {
    use super::super::*;
    use crate::testing::identity_relation;

    #[test]
    fn render_then_parse() {
        let payload = identity_relation().payload();
        let creds = Credentials::from_identity(&payload, "RegionOne").unwrap();
        assert_eq!(creds.auth_url, "http://10.0.0.30:35357/v2.0");

        let env = parse(&creds.render(), Path::new("/root/novarc")).unwrap();
        assert_eq!(env, creds.env());
        assert_eq!(env["OS_USERNAME"], "designate");
    }

    #[test]
    fn incomplete_identity_has_no_credentials() {
        let mut payload = identity_relation().payload();
        payload.remove("service_password");
        assert!(Credentials::from_identity(&payload, "RegionOne").is_none());
    }

    #[test]
    fn parse_tolerates_quotes_and_comments() {
        let env = parse(
            "# admin\nexport OS_USERNAME='admin'\n\nOS_PASSWORD=\"pw\"\n",
            Path::new("novarc"),
        )
        .unwrap();
        assert_eq!(env["OS_USERNAME"], "admin");
        assert_eq!(env["OS_PASSWORD"], "pw");
    }

    #[test]
    fn parse_rejects_garbage() {
        assert!(matches!(
            parse("export OS_USERNAME", Path::new("novarc")),
            Err(DesignateError::Credentials { .. })
        ));
    }
}
