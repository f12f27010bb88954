use super::types::AuditConfig;
use std::fs;
use std::path::Path;

impl AuditConfig {
    /// Load configuration from a TOML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let content = fs::read_to_string(path.as_ref())
            .map_err(|e| anyhow::anyhow!("Failed to read config file: {}", e))?;

        let mut config: AuditConfig = toml::from_str(&content)
            .map_err(|e| anyhow::anyhow!("Failed to parse config file: {}", e))?;

        config.apply_env_overrides()?;
        config.validate()?;

        Ok(config)
    }

    /// Apply environment variable overrides for the backup endpoint.
    ///
    /// Supported variables:
    /// - SQLGATE_BACKUP_HOST: Override backup_host
    /// - SQLGATE_BACKUP_PORT: Override backup_port
    /// - SQLGATE_BACKUP_USER: Override backup_user
    /// - SQLGATE_BACKUP_PASSWORD: Override backup_password
    ///
    /// Environment variables take precedence over file values.
    fn apply_env_overrides(&mut self) -> anyhow::Result<()> {
        use std::env;

        if let Ok(host) = env::var("SQLGATE_BACKUP_HOST") {
            self.backup_host = host;
        }

        if let Ok(port_str) = env::var("SQLGATE_BACKUP_PORT") {
            self.backup_port = port_str
                .parse()
                .map_err(|_| anyhow::anyhow!("Invalid SQLGATE_BACKUP_PORT value: {}", port_str))?;
        }

        if let Ok(user) = env::var("SQLGATE_BACKUP_USER") {
            self.backup_user = user;
        }

        if let Ok(password) = env::var("SQLGATE_BACKUP_PASSWORD") {
            self.backup_password = password;
        }

        Ok(())
    }

    /// Validate configuration settings.
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.max_index_identifier_len == 0 {
            return Err(anyhow::anyhow!("max_index_identifier_len cannot be 0"));
        }

        for (name, level) in &self.severity_overrides {
            if *level > 2 {
                return Err(anyhow::anyhow!(
                    "Invalid severity {} for '{}'. Must be 0, 1 or 2",
                    level,
                    name
                ));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_toml_with_defaults() {
        let cfg: AuditConfig = toml::from_str(
            r#"
enable_drop_table = true
check_table_comment = true
max_keys = 8

[severity_overrides]
ER_CHAR_TO_VARCHAR_LEN = 2
"#,
        )
        .unwrap();
        assert!(cfg.enable_drop_table);
        assert!(cfg.check_table_comment);
        assert_eq!(cfg.max_keys, 8);
        assert!(cfg.enable_nullable);
        assert_eq!(
            cfg.severity_overrides.get("ER_CHAR_TO_VARCHAR_LEN"),
            Some(&2)
        );
        cfg.validate().unwrap();
    }

    #[test]
    fn test_validate_rejects_bad_severity() {
        let cfg: AuditConfig = toml::from_str(
            r#"
[severity_overrides]
ER_DUP_INDEX = 5
"#,
        )
        .unwrap();
        assert!(cfg.validate().is_err());
    }
}
