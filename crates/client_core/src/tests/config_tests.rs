use super::*;

use std::{
    env,
    time::{SystemTime, UNIX_EPOCH},
};

fn lookup_from<'a>(pairs: &'a [(&'a str, &'a str)]) -> impl Fn(&str) -> Option<String> + 'a {
    move |key| {
        pairs
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, v)| v.to_string())
    }
}

#[test]
fn defaults_are_valid() {
    let settings = ControllerSettings::default();
    settings.validate().expect("defaults validate");
    assert_eq!(settings.content_field, "content");
    assert_eq!(settings.overlap_policy, OverlapPolicy::Supersede);
    assert_eq!(settings.reasoning_retention, ReasoningRetention::Latest);
    assert_eq!(settings.transcript_cap, None);
}

#[test]
fn overrides_replace_every_known_key() {
    let mut settings = ControllerSettings::default();
    apply_overrides(
        &mut settings,
        lookup_from(&[
            ("chat_endpoint", "https://leads.example.com/chat"),
            ("content_field", "human_say"),
            ("request_timeout_secs", "5"),
            ("fallback_text", "Xin lỗi, vui lòng thử lại."),
            ("overlap_policy", "Reject"),
            ("reasoning_history", "20"),
            ("transcript_cap", "200"),
        ]),
    );

    assert_eq!(settings.chat_endpoint, "https://leads.example.com/chat");
    assert_eq!(settings.content_field, "human_say");
    assert_eq!(settings.request_timeout, Duration::from_secs(5));
    assert_eq!(settings.fallback_text, "Xin lỗi, vui lòng thử lại.");
    assert_eq!(settings.overlap_policy, OverlapPolicy::Reject);
    assert_eq!(
        settings.reasoning_retention,
        ReasoningRetention::History { limit: 20 }
    );
    assert_eq!(settings.transcript_cap, Some(200));
    settings.validate().expect("overridden settings validate");
}

#[test]
fn unparseable_overrides_keep_previous_values() {
    let mut settings = ControllerSettings::default();
    apply_overrides(
        &mut settings,
        lookup_from(&[
            ("request_timeout_secs", "soon"),
            ("overlap_policy", "queue"),
            ("reasoning_history", "-1"),
            ("transcript_cap", "lots"),
        ]),
    );
    assert_eq!(settings, ControllerSettings::default());
}

#[test]
fn history_of_one_or_zero_means_latest_only() {
    assert_eq!(ReasoningRetention::from_history_len(0), ReasoningRetention::Latest);
    assert_eq!(ReasoningRetention::from_history_len(1), ReasoningRetention::Latest);
    assert_eq!(ReasoningRetention::Latest.limit(), 1);
    assert_eq!(ReasoningRetention::from_history_len(3).limit(), 3);
}

#[test]
fn validate_rejects_bad_values() {
    let mut settings = ControllerSettings {
        chat_endpoint: "ftp://example.com/chat".into(),
        ..ControllerSettings::default()
    };
    assert!(matches!(
        settings.validate(),
        Err(ConfigError::InvalidEndpoint { .. })
    ));

    settings.chat_endpoint = "not a url".into();
    assert!(matches!(
        settings.validate(),
        Err(ConfigError::InvalidEndpoint { .. })
    ));

    settings = ControllerSettings {
        content_field: "  ".into(),
        ..ControllerSettings::default()
    };
    assert_eq!(settings.validate(), Err(ConfigError::EmptyContentField));

    settings = ControllerSettings {
        request_timeout: Duration::ZERO,
        ..ControllerSettings::default()
    };
    assert_eq!(settings.validate(), Err(ConfigError::ZeroTimeout));

    settings = ControllerSettings {
        transcript_cap: Some(1),
        ..ControllerSettings::default()
    };
    assert_eq!(settings.validate(), Err(ConfigError::TranscriptCapTooSmall));
}

#[test]
fn settings_file_accepts_strings_and_numbers() {
    let parsed = parse_settings_file(
        r#"
chat_endpoint = "http://10.0.0.5:8000/chat"
request_timeout_secs = 12
transcript_cap = 500
"#,
    )
    .expect("parse");
    assert_eq!(
        parsed.get("chat_endpoint").map(String::as_str),
        Some("http://10.0.0.5:8000/chat")
    );
    assert_eq!(parsed.get("request_timeout_secs").map(String::as_str), Some("12"));
    assert_eq!(parsed.get("transcript_cap").map(String::as_str), Some("500"));
}

#[test]
fn load_settings_from_reads_explicit_file() {
    let suffix = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("clock")
        .as_nanos();
    let temp_root = env::temp_dir().join(format!("chat_client_core_config_{suffix}"));
    fs::create_dir_all(&temp_root).expect("temp root");
    let path = temp_root.join("chat.toml");
    fs::write(
        &path,
        "content_field = \"human_say\"\nreasoning_history = 5\n",
    )
    .expect("write settings");

    let settings = load_settings_from(&path).expect("load");
    assert_eq!(settings.content_field, "human_say");
    assert_eq!(
        settings.reasoning_retention,
        ReasoningRetention::History { limit: 5 }
    );

    fs::remove_dir_all(temp_root).expect("cleanup");
}

#[test]
fn load_settings_from_missing_file_names_the_path() {
    let err = load_settings_from(Path::new("/definitely/not/here/chat.toml"))
        .expect_err("must fail");
    assert!(err.to_string().contains("/definitely/not/here/chat.toml"));
}
