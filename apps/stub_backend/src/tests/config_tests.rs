use super::*;

#[test]
fn defaults_listen_where_the_client_looks() {
    let settings = Settings::default();
    assert_eq!(settings.bind_addr, "127.0.0.1:8000");
    assert_eq!(settings.agent_name, "DaisyBot");
}

#[test]
fn overrides_replace_only_named_keys() {
    let mut settings = Settings::default();
    let file_cfg: HashMap<String, String> =
        toml::from_str("bind_addr = \"0.0.0.0:9000\"").expect("toml");
    apply_overrides(&mut settings, |key| file_cfg.get(key).cloned());

    assert_eq!(settings.bind_addr, "0.0.0.0:9000");
    assert_eq!(settings.company_name, Settings::default().company_name);
}
