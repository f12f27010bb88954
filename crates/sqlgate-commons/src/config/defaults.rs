// Default value functions for serde.

pub fn default_false() -> bool {
    false
}

pub fn default_true() -> bool {
    true
}

pub fn default_max_keys() -> u32 {
    16
}

pub fn default_max_index_identifier_len() -> u32 {
    64
}

pub fn default_backup_host() -> String {
    String::new()
}

pub fn default_backup_port() -> u16 {
    0
}
