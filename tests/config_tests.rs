use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use pretty_assertions::assert_eq;
use ploy_config::config::{
    CustomMassager, Hook, MacroCleaner, Massager, MassagerKey, MassagerKind, Options, Plugin,
    StartupScript,
};
use ploy_config::{Config, ConfigError, Section, Value};
use rstest::rstest;

fn parse(text: &str) -> Result<Config, ConfigError> {
    Config::builder().with_str("test", text).parse()
}

const MASSAGED: &str = "\
[global:global]
massagers =
    host:enabled = ploy.config.BooleanMassager
    host:port = ploy.config.IntegerMassager
    host:keyfile = ploy.config.PathMassager
    host:startup_script = ploy.config.StartupScriptMassager
";

#[rstest]
#[case("Yes", true)]
#[case("on", true)]
#[case("TRUE", true)]
#[case("no", false)]
#[case("Off", false)]
fn test_boolean_massager(#[case] raw: &str, #[case] expected: bool) {
    let config = parse(&format!("{MASSAGED}[host:x]\nenabled = {raw}\n")).unwrap();
    assert_eq!(config["host"]["x"].get("enabled").unwrap(), Value::Bool(expected));
}

#[test]
fn test_boolean_massager_rejects_unknown_word() {
    let config = parse(&format!("{MASSAGED}[host:x]\nenabled = maybe\n")).unwrap();
    let err = config["host"]["x"].get("enabled").unwrap_err();
    assert!(matches!(
        err,
        ConfigError::InvalidValue { ref key, ref group, ref section, .. }
            if key == "enabled" && group == "host" && section == "x"
    ));
}

#[test]
fn test_integer_massager() {
    let config = parse(&format!("{MASSAGED}[host:x]\nport = 22\n[host:y]\nport = ssh\n")).unwrap();
    assert_eq!(config["host"]["x"].get_integer("port").unwrap(), 22);
    assert!(matches!(
        config["host"]["y"].get("port"),
        Err(ConfigError::InvalidInteger { .. })
    ));
}

#[rstest]
#[case("id_rsa", "/etc/conf/id_rsa")]
#[case("keys/id_rsa", "/etc/conf/keys/id_rsa")]
#[case("/abs/id_rsa", "/abs/id_rsa")]
fn test_path_massager(#[case] raw: &str, #[case] expected: &str) {
    let config = Config::builder()
        .with_str("test", format!("{MASSAGED}[host:x]\nkeyfile = {raw}\n"))
        .with_path("/etc/conf")
        .parse()
        .unwrap();
    assert_eq!(config["host"]["x"].get_path("keyfile").unwrap(), PathBuf::from(expected));
}

#[test]
fn test_startup_script_massager() {
    let config = Config::builder()
        .with_str("test", format!("{MASSAGED}[host:x]\nstartup_script = gzip:boot.sh\n"))
        .with_path("/etc/conf")
        .parse()
        .unwrap();
    assert_eq!(
        config["host"]["x"].get("startup_script").unwrap(),
        Value::StartupScript(StartupScript {
            path: PathBuf::from("/etc/conf/boot.sh"),
            gzip: true,
        })
    );
}

#[test]
fn test_massagers_only_apply_to_their_group() {
    let config = parse(&format!("{MASSAGED}[instance:x]\nport = 22\n")).unwrap();
    assert_eq!(config["instance"]["x"].get("port").unwrap(), Value::from("22"));
}

#[test]
fn test_reads_are_repeatable() {
    let config = parse(&format!("{MASSAGED}[host:x]\nport = 22\nenabled = yes\n")).unwrap();
    let section = &config["host"]["x"];
    for key in ["port", "enabled"] {
        assert_eq!(section.get(key).unwrap(), section.get(key).unwrap());
    }
}

#[test]
fn test_missing_key_skips_massagers() {
    let config = parse(&format!("{MASSAGED}[host:x]\nip = 1.2.3.4\n")).unwrap();
    assert!(matches!(
        config["host"]["x"].get("port"),
        Err(ConfigError::MissingKey { .. })
    ));
}

#[test]
fn test_massager_cascade_precedence() {
    let config = parse("[host:x]\nport = 22\n").unwrap();
    let local = Massager::new(MassagerKey::new("host", "port"), MassagerKind::Boolean);
    let mut section = config.get_section_with_overrides("host", "x", [("port", "yes")]).unwrap();
    section.add_massager(local).unwrap();

    // Local massager applies while the config has none.
    assert_eq!(section.get("port").unwrap(), Value::Bool(true));

    // Any-group registration on the config beats the local one.
    config
        .add_massager(Massager::new(MassagerKey::any_group("port"), MassagerKind::Raw))
        .unwrap();
    assert_eq!(section.get("port").unwrap(), Value::from("yes"));

    // Group registration on the config beats the any-group one.
    config
        .add_massager(Massager::new(MassagerKey::new("host", "port"), MassagerKind::Integer))
        .unwrap();
    assert!(matches!(
        section.get("port"),
        Err(ConfigError::InvalidInteger { .. })
    ));
    assert_eq!(config["host"]["x"].get("port").unwrap(), Value::Integer(22));
}

#[test]
fn test_any_group_declaration() {
    let config = parse(
        "[global:global]\nmassagers = *:port = ploy.config.IntegerMassager\n\
         [host:a]\nport = 1\n[instance:b]\nport = 2\n",
    )
    .unwrap();
    assert_eq!(config["host"]["a"].get_integer("port").unwrap(), 1);
    assert_eq!(config["instance"]["b"].get_integer("port").unwrap(), 2);
}

#[test]
fn test_duplicate_declaration_fails_parse() {
    let result = parse(
        "[global:a]\nmassagers = host:port = ploy.config.IntegerMassager\n\
         [global:b]\nmassagers = host:port = ploy.config.BooleanMassager\n",
    );
    assert!(matches!(result, Err(ConfigError::DuplicateMassager(_))));
}

#[test]
fn test_duplicate_add_keeps_first() {
    let config = parse("[host:x]\nport = 22\n").unwrap();
    config
        .add_massager(Massager::new(MassagerKey::new("host", "port"), MassagerKind::Integer))
        .unwrap();
    let err = config
        .add_massager(Massager::new(MassagerKey::new("host", "port"), MassagerKind::Boolean))
        .unwrap_err();

    assert!(matches!(err, ConfigError::DuplicateMassager(ref key) if key.to_string() == "host:port"));
    assert_eq!(config["host"]["x"].get("port").unwrap(), Value::Integer(22));
}

#[test]
fn test_malformed_declaration_fails_parse() {
    let result = parse("[global:global]\nmassagers = host port\n");
    assert!(matches!(result, Err(ConfigError::MalformedMassagerSpec(_))));
}

#[test]
fn test_unresolvable_declaration_fails_parse() {
    let result = parse("[global:global]\nmassagers = host:port = nowhere.Massager\n");
    assert!(matches!(result, Err(ConfigError::UnresolvableName { .. })));
}

#[test]
fn test_overrides_leave_original_untouched() {
    let config = parse("[host:x]\nport = 22\nip = 1.2.3.4\n").unwrap();
    let section = config
        .get_section_with_overrides("host", "x", [("port", "2222")])
        .unwrap();

    assert_eq!(section.get_str("port").unwrap(), "2222");
    assert_eq!(section.get_str("ip").unwrap(), "1.2.3.4");
    assert_eq!(config["host"]["x"].get_str("port").unwrap(), "22");
}

#[test]
fn test_overrides_are_massaged() {
    let config = parse(&format!("{MASSAGED}[host:x]\nport = 22\n")).unwrap();
    let section = config
        .get_section_with_overrides("host", "x", [("port", "2222")])
        .unwrap();
    assert_eq!(section.get_integer("port").unwrap(), 2222);
}

#[test]
fn test_overrides_without_values() {
    let config = parse("[host:x]\nport = 22\n").unwrap();
    let section = config
        .get_section_with_overrides("host", "x", Vec::<(String, String)>::new())
        .unwrap();
    assert_eq!(section.get_str("port").unwrap(), "22");
}

#[test]
fn test_overrides_unknown_section() {
    let config = parse("[host:x]\nport = 22\n").unwrap();
    let result = config.get_section_with_overrides("host", "y", [("port", "1")]);
    assert!(matches!(result, Err(ConfigError::UnknownSection { .. })));
}

#[test]
fn test_copy_outliving_config_reads_raw() {
    let section = {
        let config = parse(&format!("{MASSAGED}[host:x]\nport = 22\n")).unwrap();
        let section = config
            .get_section_with_overrides("host", "x", [("port", "23")])
            .unwrap();
        assert_eq!(section.get_integer("port").unwrap(), 23);
        section
    };
    assert_eq!(section.get("port").unwrap(), Value::from("23"));
}

#[test]
fn test_pseudo_keys() {
    let config = parse("[host:web]\nip = 1.2.3.4\n").unwrap();
    let web = &config["host"]["web"];
    assert_eq!(web.get_str("__groupname__").unwrap(), "host");
    assert_eq!(web.get_str("__name__").unwrap(), "web");
    assert_eq!(web.keys().collect::<Vec<_>>(), ["ip"]);
}

#[test]
fn test_global_group_and_legacy_plugin_group() {
    let config = parse("[settings]\nx = 1\n[plugin:old]\ny = 2\n").unwrap();
    assert_eq!(config["global"]["settings"].get_str("x").unwrap(), "1");
    assert!(!config.contains_group("plugin"));
}

#[test]
fn test_later_sources_update_sections() {
    let dir = tempfile::tempdir().unwrap();
    let base = dir.path().join("ploy.conf");
    let local = dir.path().join("ploy.local.conf");
    std::fs::write(&base, "[host:x]\nip = 1.2.3.4\nport = 22\n").unwrap();
    std::fs::write(&local, "[host:x]\nport = 2222\n[host:y]\nip = 5.6.7.8\n").unwrap();

    let config = Config::builder()
        .with_file(&base, true)
        .with_file(&local, true)
        .with_file(dir.path().join("missing.conf"), false)
        .parse()
        .unwrap();

    let x = &config["host"]["x"];
    assert_eq!(x.get_str("ip").unwrap(), "1.2.3.4");
    assert_eq!(x.get_str("port").unwrap(), "2222");
    assert_eq!(config["host"].names().collect::<Vec<_>>(), ["x", "y"]);
    assert_eq!(config.path(), dir.path());
}

#[test]
fn test_defaults_apply_across_files() {
    let dir = tempfile::tempdir().unwrap();
    let first = dir.path().join("a.conf");
    let second = dir.path().join("b.conf");
    std::fs::write(&first, "[DEFAULT]\nuser = root\n[host:x]\nport = 22\n[host:z]\nip = 9.9.9.9\n").unwrap();
    std::fs::write(&second, "[DEFAULT]\nport = 1\nuser = deploy\n[host:x]\nip = 1.2.3.4\n").unwrap();

    let config = Config::builder()
        .with_file(&first, true)
        .with_file(&second, true)
        .parse()
        .unwrap();

    let x = &config["host"]["x"];
    assert_eq!(x.raw("port"), Some("22"));
    assert_eq!(x.raw("ip"), Some("1.2.3.4"));
    assert_eq!(x.raw("user"), Some("deploy"));
    let z = &config["host"]["z"];
    assert_eq!(z.raw("port"), Some("1"));
    assert_eq!(z.raw("user"), Some("deploy"));
}

#[test]
fn test_paths_relative_to_config_file() {
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("ploy.conf");
    std::fs::write(&file, format!("{MASSAGED}[host:x]\nkeyfile = id_rsa\n")).unwrap();

    let config = Config::builder().with_file(&file, true).parse().unwrap();
    assert_eq!(
        config["host"]["x"].get_path("keyfile").unwrap(),
        dir.path().join("id_rsa")
    );
}

#[test]
fn test_required_file_missing() {
    let result = Config::builder()
        .with_file("/nonexistent/ploy.conf", true)
        .parse();
    assert!(matches!(result, Err(ConfigError::FileNotFound(_))));
}

#[test]
fn test_parse_can_run_again() {
    let builder = Config::builder().with_str("test", "[host:x]\n< = y\n[host:y]\na = 1\n");
    let first = builder.parse().unwrap();
    let second = builder.parse().unwrap();
    assert_eq!(
        first["host"]["x"].raw_values(),
        second["host"]["x"].raw_values()
    );
}

#[test]
fn test_cycle_fails_whole_parse() {
    let result = parse("[host:a]\n< = b\nx = 1\n[host:b]\n< = a\ny = 2\n[host:c]\nz = 3\n");
    assert!(matches!(
        result,
        Err(ConfigError::CircularMacro { ref group, .. }) if group == "host"
    ));
}

#[derive(Debug)]
struct Recorder {
    calls: Arc<AtomicUsize>,
}

impl Hook for Recorder {
    fn before_start(&self, _server: &Section) {
        self.calls.fetch_add(1, Ordering::SeqCst);
    }
}

#[test]
fn test_hooks_massager() {
    let calls = Arc::new(AtomicUsize::new(0));
    let hook_calls = Arc::clone(&calls);
    let config = Config::builder()
        .with_str(
            "test",
            "[global:global]\nmassagers = host:hooks = ploy.config.HooksMassager\n\
             [host:x]\nhooks = site.hooks.Recorder site.hooks.Recorder\n",
        )
        .with_hook_type("site.hooks.Recorder", move || {
            Arc::new(Recorder {
                calls: Arc::clone(&hook_calls),
            }) as Arc<dyn Hook>
        })
        .parse()
        .unwrap();

    let section = &config["host"]["x"];
    let value = section.get("hooks").unwrap();
    let hooks = value.as_hooks().unwrap();
    assert_eq!(hooks.len(), 2);

    hooks.before_start(section);
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

#[derive(Debug)]
struct Csv;

impl CustomMassager for Csv {
    fn massage(&self, raw: &str, _: &Section, _: &str) -> Result<Value, ConfigError> {
        let items: Vec<String> = raw.split(',').map(|s| s.trim().to_string()).collect();
        Ok(Value::Custom(Arc::new(items)))
    }
}

#[test]
fn test_user_defined_massager_type() {
    let config = Config::builder()
        .with_str(
            "test",
            "[global:global]\nmassagers = host:roles = site.massagers.Csv\n\
             [host:x]\nroles = web, db\n",
        )
        .with_massager_type("site.massagers.Csv", |key| Massager::custom(key, Csv))
        .parse()
        .unwrap();

    let value = config["host"]["x"].get("roles").unwrap();
    assert_eq!(
        value.downcast_ref::<Vec<String>>().unwrap(),
        &vec!["web".to_string(), "db".to_string()]
    );
}

struct StripIp;

impl Plugin for StripIp {
    fn massagers(&self) -> Vec<Massager> {
        vec![Massager::new(MassagerKey::new("host", "port"), MassagerKind::Integer)]
    }

    fn macro_cleaners(&self, _config: &Config) -> Vec<(String, MacroCleaner)> {
        let cleaner: MacroCleaner = Arc::new(|values: &mut Options| {
            values.shift_remove("ip");
        });
        vec![("host".to_string(), cleaner)]
    }
}

#[test]
fn test_plugin_massagers_and_cleaners() {
    let config = Config::builder()
        .with_str(
            "test",
            "[host:base]\nip = 1.2.3.4\nport = 22\n[host:web]\n< = base\n\
             [instance:vm]\n< = host:base\n",
        )
        .with_plugin(StripIp)
        .parse()
        .unwrap();

    let web = &config["host"]["web"];
    assert_eq!(web.get_integer("port").unwrap(), 22);
    assert!(!web.contains_key("ip"));

    // The cleaner works on a copy of the macro and only for its own group.
    assert_eq!(config["host"]["base"].get_str("ip").unwrap(), "1.2.3.4");
    assert_eq!(config["instance"]["vm"].get_str("ip").unwrap(), "1.2.3.4");
}

#[test]
fn test_plugin_duplicates_declaration() {
    let result = Config::builder()
        .with_str(
            "test",
            "[global:global]\nmassagers = host:port = ploy.config.IntegerMassager\n",
        )
        .with_plugin(StripIp)
        .parse();
    assert!(matches!(result, Err(ConfigError::DuplicateMassager(_))));
}

#[test]
fn test_deserialize_section() {
    #[derive(Debug, PartialEq, serde::Deserialize)]
    struct Host {
        ip: String,
        port: u16,
        enabled: bool,
        keyfile: PathBuf,
    }

    let config = Config::builder()
        .with_str(
            "test",
            format!(
                "{MASSAGED}[host:base]\nenabled = on\nkeyfile = id_rsa\n\
                 [host:web]\n< = base\nip = 10.0.0.5\nport = 80\n"
            ),
        )
        .with_path("/etc/conf")
        .parse()
        .unwrap();

    let web: Host = config["host"]["web"].deserialize().unwrap();
    assert_eq!(
        web,
        Host {
            ip: "10.0.0.5".into(),
            port: 80,
            enabled: true,
            keyfile: PathBuf::from("/etc/conf/id_rsa"),
        }
    );
}
