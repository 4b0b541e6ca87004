//! Types for use when configuring zkvote modules.

use crate::*;

/// helper transcode function
fn tc<S: serde::Serialize, D: serde::de::DeserializeOwned>(
    s: &S,
) -> ZkvResult<D> {
    serde_json::from_str(
        &serde_json::to_string(s)
            .map_err(|e| ZkvError::other_src("encode", e))?,
    )
    .map_err(|e| ZkvError::other_src("decode", e))
}

/// Denotes a type used to configure a specific zkvote module.
///
/// A module config is a struct with a single camelCase property named
/// after the module (e.g. `coreCollector`), holding that module's
/// parameters. All of the module configs are merged into one flat
/// [Config] object so they can be loaded from a single file.
///
/// Module configs must tolerate missing properties by falling back to
/// their defaults, since the file may have been edited by humans.
pub trait ModConfig:
    'static
    + Sized
    + Default
    + std::fmt::Debug
    + serde::Serialize
    + serde::de::DeserializeOwned
    + Send
    + Sync
{
}

impl<T> ModConfig for T where
    T: 'static
        + Sized
        + Default
        + std::fmt::Debug
        + serde::Serialize
        + serde::de::DeserializeOwned
        + Send
        + Sync
{
}

/// Zkvote configuration.
#[derive(Debug, Default, Clone, serde::Serialize, serde::Deserialize)]
#[serde(transparent)]
pub struct Config(serde_json::Map<String, serde_json::Value>);

impl Config {
    /// Merge the top-level properties of a module config into this config.
    ///
    /// Module factories call this from their `default_config` with their
    /// default module config. Refuses to overwrite a property that another
    /// module already set.
    pub fn set_module_config<M: ModConfig>(&mut self, m: &M) -> ZkvResult<()> {
        let value: serde_json::Value = tc(m)?;
        let serde_json::Value::Object(map) = value else {
            return Err(ZkvError::other(format!(
                "module config must serialize to an object: {m:?}"
            )));
        };
        for (k, v) in map {
            if self.0.contains_key(&k) {
                return Err(ZkvError::other(format!(
                    "Refusing to overwrite conflicting module name: {k}"
                )));
            }
            self.0.insert(k, v);
        }
        Ok(())
    }

    /// Extract a module config from this config. Properties the module
    /// does not know about are ignored, missing ones take their defaults.
    pub fn get_module_config<M: ModConfig>(&self) -> ZkvResult<M> {
        tc(&self.0)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[derive(
        Debug, Default, serde::Serialize, serde::Deserialize, PartialEq,
    )]
    #[serde(default, rename_all = "camelCase")]
    struct Inner1 {
        p_a: u32,
        p_b: String,
    }

    #[derive(
        Debug, Default, serde::Serialize, serde::Deserialize, PartialEq,
    )]
    #[serde(default, rename_all = "camelCase")]
    struct Mod1 {
        mod_one: Inner1,
    }

    #[derive(Debug, serde::Serialize, serde::Deserialize, PartialEq)]
    #[serde(default, rename_all = "camelCase")]
    struct Inner2 {
        p_c: u32,
    }

    impl Default for Inner2 {
        fn default() -> Self {
            Self { p_c: 42 }
        }
    }

    #[derive(
        Debug, Default, serde::Serialize, serde::Deserialize, PartialEq,
    )]
    #[serde(default, rename_all = "camelCase")]
    struct Mod2 {
        mod_two: Inner2,
    }

    #[test]
    fn config_usage_example() {
        let mut config = Config::default();
        config.set_module_config(&Mod1::default()).unwrap();
        config.set_module_config(&Mod2::default()).unwrap();

        assert_eq!(
            r##"{
  "modOne": {
    "pA": 0,
    "pB": ""
  },
  "modTwo": {
    "pC": 42
  }
}"##,
            serde_json::to_string_pretty(&config).unwrap()
        );

        // ensure we can load a weird config from disk
        let config: Config = serde_json::from_str(
            r#"{
          "modBAD": { "foo": "bar" },
          "modOne": { "pB": "test-p_b" },
          "modTwo": { "extra": "foo" }
        }"#,
        )
        .unwrap();

        assert_eq!(
            Mod1 {
                mod_one: Inner1 {
                    p_a: 0,
                    p_b: "test-p_b".to_string(),
                }
            },
            config.get_module_config::<Mod1>().unwrap(),
        );

        assert_eq!(Mod2::default(), config.get_module_config().unwrap());

        // unset mods get the default
        assert_eq!(
            Mod1::default(),
            Config::default().get_module_config().unwrap(),
        );
    }

    #[test]
    fn refuse_conflicting_module_names() {
        let mut config = Config::default();
        config.set_module_config(&Mod1::default()).unwrap();
        config.set_module_config(&Mod1::default()).unwrap_err();
    }
}
