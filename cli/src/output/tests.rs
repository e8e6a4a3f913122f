//! Unit tests for the output module

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::module_inception)]
mod tests {
    use std::collections::BTreeMap;
    use std::path::Path;

    use owo_colors::OwoColorize;
    use vcprov_common::{PowerState, VApp, VdcSummary, VmSummary};

    use crate::application::services::inventory::VdcOverview;
    use crate::domain::{
        ErrorKind, ProvisionError, ProvisionedVapp, Stage, StageFailure, VcprovConfig,
    };
    use crate::output::json::{format_error, format_failure};
    use crate::output::{HumanRenderer, OutputContext, Styles};

    fn vapp() -> VApp {
        let mut vms = BTreeMap::new();
        vms.insert(
            "vm-1".to_string(),
            VmSummary {
                id: "vm-1".into(),
                name: "web01".into(),
                status: PowerState::PoweredOn,
                addresses: vec!["10.0.0.5".into()],
            },
        );
        VApp {
            id: "vapp-1".into(),
            name: "web01".into(),
            status: PowerState::PoweredOn,
            vms,
            primary_address: Some("10.0.0.5".into()),
            secondary_address: None,
        }
    }

    // --- Styles ---

    #[test]
    fn test_styles_default_has_no_colors() {
        let styles = Styles::default();
        let styled = "test".style(styles.success);
        assert_eq!(format!("{styled}"), "test");
    }

    #[test]
    fn test_styles_colorize_applies_colors() {
        let mut styles = Styles::default();
        styles.colorize();
        let styled = format!("{}", "test".style(styles.success));
        assert!(styled.contains("\x1b["), "should contain ANSI escape code");
        assert!(styled.contains("32"), "should contain green color code");
    }

    #[test]
    fn test_output_context_no_color_flag_disables_colors() {
        let ctx = OutputContext::new(true, false);
        let styled = format!("{}", "test".style(ctx.styles.success));
        assert!(!styled.contains("\x1b["));
    }

    #[test]
    fn test_output_context_quiet_flag_sets_quiet() {
        assert!(OutputContext::new(false, true).quiet);
        assert!(!OutputContext::new(false, false).quiet);
    }

    #[test]
    fn test_error_is_printed_even_when_quiet() {
        let ctx = OutputContext::new(true, true);
        ctx.error("connection refused");
    }

    // --- JSON documents ---

    #[test]
    fn test_failure_json_has_stage_kind_and_message() {
        let err = ProvisionError::AddressTimeout {
            vapp_id: "vapp-1".into(),
            attempts: 200,
        };
        let failure = StageFailure::new(Stage::AddressAcquired, &err, Some("vapp-1"));
        let v: serde_json::Value = serde_json::from_str(&format_failure(&failure).unwrap()).unwrap();
        assert_eq!(v["error"], true);
        assert_eq!(v["stage"], "AddressAcquired");
        assert_eq!(v["errorKind"], "AddressTimeout");
        assert!(v["message"].as_str().unwrap().contains("vcprov server delete vapp-1"));
    }

    #[test]
    fn test_failure_json_without_vapp_omits_id() {
        let err = ProvisionError::InvalidRequest("name is required".into());
        let failure = StageFailure::new(Stage::Requested, &err, None);
        let v: serde_json::Value = serde_json::from_str(&format_failure(&failure).unwrap()).unwrap();
        assert!(v.get("vappId").is_none());
        assert_eq!(v["errorKind"], ErrorKind::InvalidRequest.to_string());
    }

    #[test]
    fn test_provisioned_json_uses_camel_case() {
        let done = ProvisionedVapp {
            vapp_id: "vapp-1".into(),
            vm_id: "vm-1".into(),
            primary_address: "10.0.0.5".into(),
            secondary_address: None,
            reached: Stage::Handoff,
        };
        let v = serde_json::to_value(&done).unwrap();
        assert_eq!(v["vappId"], "vapp-1");
        assert_eq!(v["vmId"], "vm-1");
        assert_eq!(v["primaryAddress"], "10.0.0.5");
        assert!(v["secondaryAddress"].is_null());
        assert!(v.get("reached").is_none());
    }

    #[test]
    fn test_format_error_shape() {
        let v: serde_json::Value =
            serde_json::from_str(&format_error("no URL configured", "InvalidRequest").unwrap())
                .unwrap();
        assert_eq!(v["error"], true);
        assert_eq!(v["errorKind"], "InvalidRequest");
        assert_eq!(v["message"], "no URL configured");
    }

    // --- Human renderer smoke tests (no_color=true keeps test output plain) ---

    #[test]
    fn test_human_renderer_handles_every_document() {
        let ctx = OutputContext::new(true, false);
        let r = HumanRenderer::new(&ctx);
        r.render_vapp(&vapp());
        r.render_vdc(&VdcOverview {
            vdc: VdcSummary {
                id: "vdc-1".into(),
                name: "Pool A".into(),
                ..VdcSummary::default()
            },
            vapps: vec![vapp()],
        });
        r.render_config(&VcprovConfig::default(), Path::new("/tmp/config.yaml"));
        let err = ProvisionError::Canceled;
        r.render_failure(&StageFailure::new(Stage::PoweredOn, &err, Some("vapp-1")));
    }

    #[test]
    fn test_human_renderer_empty_vdc() {
        let ctx = OutputContext::new(true, true);
        HumanRenderer::new(&ctx).render_vdc(&VdcOverview {
            vdc: VdcSummary::default(),
            vapps: Vec::new(),
        });
    }
}

mod proptests {
    use owo_colors::OwoColorize;
    use proptest::prelude::*;

    use crate::output::{OutputContext, Styles};

    proptest! {
        /// OutputContext with no_color=true never produces ANSI codes
        #[test]
        fn prop_no_color_never_produces_ansi(text in "[a-zA-Z0-9 ]{1,50}") {
            let ctx = OutputContext::new(true, false);
            let styled = format!("{}", text.style(ctx.styles.success));
            prop_assert!(!styled.contains("\x1b["));
        }

        /// Styles::colorize produces distinct message styles
        #[test]
        fn prop_colorize_produces_distinct_styles(_seed in 0u32..20) {
            let mut styles = Styles::default();
            styles.colorize();
            let outputs = [
                format!("{}", "x".style(styles.success)),
                format!("{}", "x".style(styles.warning)),
                format!("{}", "x".style(styles.error)),
                format!("{}", "x".style(styles.step)),
            ];
            for i in 0..outputs.len() {
                for j in (i + 1)..outputs.len() {
                    prop_assert_ne!(&outputs[i], &outputs[j]);
                }
            }
        }

        /// Helper methods do not panic with any printable message
        #[test]
        fn prop_helper_methods_do_not_panic(msg in "[a-zA-Z0-9 .,!?_-]{0,100}", quiet in proptest::bool::ANY) {
            let ctx = OutputContext::new(true, quiet);
            ctx.success(&msg);
            ctx.warn(&msg);
            ctx.error(&msg);
            ctx.info(&msg);
            ctx.header(&msg);
            ctx.kv("key", &msg);
        }
    }
}
