//! tests/campaign_model_tests.rs

#[cfg(test)]
mod tests {
    use crate::models::campaign_model::CampaignRequest;
    use crate::models::session_model::{
        ControlCommand, InboundFrame, LogLevel, ProgressSnapshot, SessionEvent,
    };
    use crate::tests::support::campaign;

    #[test]
    fn test_total_respects_cap() {
        let mut request = campaign(&["a@relay.io"], &["1@x.io", "2@x.io", "3@x.io"]);
        assert_eq!(request.total(), 3);
        request.send_cap = 2;
        assert_eq!(request.total(), 2);
        request.send_cap = 10;
        assert_eq!(request.total(), 3);
    }

    #[test]
    fn test_delay_bounds_are_ordered() {
        let mut request = campaign(&["a@relay.io"], &["1@x.io"]);
        request.min_delay = 5000;
        request.max_delay = 1000;
        assert_eq!(request.delay_bounds(), (1000, 5000));
    }

    #[test]
    fn test_operator_payload_defaults() {
        let request: CampaignRequest = serde_json::from_str(
            r#"{
                "smtps": [{ "host": "smtp.brand.io", "user": "news@brand.io", "pass": "pw" }],
                "recipients": ["1@x.io"],
                "subject": "Hi",
                "htmlBody": "<p>x</p>",
                "emailsPerRotation": 0,
                "totalMailsToSend": 5,
                "useProxies": true,
                "proxies": ["10.0.0.1:1080"]
            }"#,
        )
        .unwrap();

        assert_eq!(request.credentials[0].principal, "news@brand.io");
        assert_eq!(request.credentials[0].port, None);
        assert_eq!(request.delay_bounds(), (1000, 3000));
        assert_eq!(request.cadence(), 1);
        assert_eq!(request.send_cap, 5);
        assert_eq!(request.preferred_port(), 587);
        assert_eq!(request.active_proxies(), &["10.0.0.1:1080".to_string()]);
    }

    #[test]
    fn test_port_accepts_text_or_number() {
        let text: CampaignRequest = serde_json::from_str(r#"{"smtpPort":"465"}"#).unwrap();
        assert_eq!(text.preferred_port(), 465);
        let number: CampaignRequest = serde_json::from_str(r#"{"port":2525}"#).unwrap();
        assert_eq!(number.preferred_port(), 2525);
        let zero: CampaignRequest = serde_json::from_str(r#"{"port":0}"#).unwrap();
        assert_eq!(zero.preferred_port(), 587);
    }

    #[test]
    fn test_secret_not_in_debug_output() {
        let request = campaign(&["a@relay.io"], &["1@x.io"]);
        let debug = format!("{:?}", request.credentials[0]);
        assert!(debug.contains("a@relay.io"));
        assert!(!debug.contains("secret"));
    }

    #[test]
    fn test_control_frames_parse_to_commands() {
        let pause: InboundFrame = serde_json::from_str(r#"{"type":"pause"}"#).unwrap();
        assert_eq!(pause.control(), Some(ControlCommand::Pause));
        let stop: InboundFrame = serde_json::from_str(r#"{"type":"stop"}"#).unwrap();
        assert_eq!(stop.control(), Some(ControlCommand::Stop));
        assert!(serde_json::from_str::<InboundFrame>(r#"{"type":"explode"}"#).is_err());
    }

    #[test]
    fn test_events_serialize_with_type_tag() {
        let event = SessionEvent::log(LogLevel::Warn, "Campaign paused");
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "log");
        assert_eq!(json["level"], "warn");

        let progress = SessionEvent::Progress(ProgressSnapshot {
            sent: 1,
            failed: 0,
            total: 3,
            percent: ProgressSnapshot::percent_of(1, 3),
            current_credential: "a@relay.io".to_string(),
            current_recipient: "1@x.io".to_string(),
            current_proxy: "Direct".to_string(),
            current_port: 587,
        });
        let json = serde_json::to_value(&progress).unwrap();
        assert_eq!(json["type"], "progress");
        assert_eq!(json["percent"], 33);
        assert_eq!(json["currentProxy"], "Direct");
    }

    #[test]
    fn test_percent_handles_empty_total() {
        assert_eq!(ProgressSnapshot::percent_of(0, 0), 0);
        assert_eq!(ProgressSnapshot::percent_of(2, 3), 67);
    }
}
