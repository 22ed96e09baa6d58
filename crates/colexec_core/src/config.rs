use std::collections::HashMap;
use std::sync::LazyLock;

use colexec_error::{DbError, Result, ResultExt};
use serde::{Deserialize, Serialize};

/// Configuration for function execution and nested column handling.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExecutionConfig {
    /// Use a compiled kernel when a function supports one for the argument
    /// types.
    pub compile_expressions: bool,
    /// Run both the compiled and interpreted paths and error if they differ.
    pub verify_compiled_kernels: bool,
    /// Validate array sizes of the output of flatten in addition to the input.
    pub validate_nested_sizes_after_flatten: bool,
}

impl Default for ExecutionConfig {
    fn default() -> Self {
        ExecutionConfig {
            compile_expressions: true,
            verify_compiled_kernels: false,
            validate_nested_sizes_after_flatten: false,
        }
    }
}

impl ExecutionConfig {
    /// Parse a config from a JSON object. Missing fields use their defaults.
    pub fn from_json(s: &str) -> Result<Self> {
        serde_json::from_str(s).context("Failed to parse execution config")
    }

    pub fn set_from_str(&mut self, name: &str, value: &str) -> Result<()> {
        let func = GET_SET_FUNCTIONS
            .get(name)
            .ok_or_else(|| DbError::new(format!("Missing setting for '{name}'")))?;

        (func.set)(value, self)
    }

    pub fn get_as_string(&self, name: &str) -> Result<String> {
        let func = GET_SET_FUNCTIONS
            .get(name)
            .ok_or_else(|| DbError::new(format!("Missing setting for '{name}'")))?;

        Ok((func.get)(self))
    }

    pub fn reset(&mut self, name: &str) -> Result<()> {
        let def_conf = Self::default();
        let value = def_conf.get_as_string(name)?;
        self.set_from_str(name, &value)
    }

    /// Names and descriptions of all settings, sorted by name.
    pub fn settings() -> Vec<SettingDescription> {
        let mut settings: Vec<_> = GET_SET_FUNCTIONS
            .iter()
            .map(|(&name, func)| SettingDescription {
                name,
                description: func.description,
            })
            .collect();
        settings.sort_unstable_by_key(|s| s.name);
        settings
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SettingDescription {
    pub name: &'static str,
    pub description: &'static str,
}

struct SettingFunctions {
    set: fn(value: &str, conf: &mut ExecutionConfig) -> Result<()>,
    get: fn(conf: &ExecutionConfig) -> String,
    description: &'static str,
}

impl SettingFunctions {
    const fn new<S: ExecutionSetting>() -> Self {
        SettingFunctions {
            set: S::set_from_str as _,
            get: S::get_as_string as _,
            description: S::DESCRIPTION,
        }
    }
}

fn insert_setting<S: ExecutionSetting>(map: &mut HashMap<&'static str, SettingFunctions>) {
    if map.insert(S::NAME, SettingFunctions::new::<S>()).is_some() {
        panic!("Duplicate settings names: {}", S::NAME);
    }
}

static GET_SET_FUNCTIONS: LazyLock<HashMap<&'static str, SettingFunctions>> = LazyLock::new(|| {
    let mut map = HashMap::new();

    insert_setting::<CompileExpressions>(&mut map);
    insert_setting::<VerifyCompiledKernels>(&mut map);
    insert_setting::<ValidateNestedSizesAfterFlatten>(&mut map);

    map
});

pub trait ExecutionSetting: Sync + Send + 'static {
    const NAME: &'static str;
    const DESCRIPTION: &'static str;

    fn set_from_str(value: &str, conf: &mut ExecutionConfig) -> Result<()>;
    fn get_as_string(conf: &ExecutionConfig) -> String;
}

fn parse_bool(name: &str, value: &str) -> Result<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "on" | "1" => Ok(true),
        "false" | "off" | "0" => Ok(false),
        _ => Err(DbError::new("Invalid boolean value for setting")
            .with_field("setting", name)
            .with_field("value", value)),
    }
}

pub struct CompileExpressions;

impl ExecutionSetting for CompileExpressions {
    const NAME: &'static str = "compile_expressions";
    const DESCRIPTION: &'static str = "Use compiled kernels for functions that support them";

    fn set_from_str(value: &str, conf: &mut ExecutionConfig) -> Result<()> {
        conf.compile_expressions = parse_bool(Self::NAME, value)?;
        Ok(())
    }

    fn get_as_string(conf: &ExecutionConfig) -> String {
        conf.compile_expressions.to_string()
    }
}

pub struct VerifyCompiledKernels;

impl ExecutionSetting for VerifyCompiledKernels {
    const NAME: &'static str = "verify_compiled_kernels";
    const DESCRIPTION: &'static str =
        "Check compiled kernel output against the interpreted path (debugging)";

    fn set_from_str(value: &str, conf: &mut ExecutionConfig) -> Result<()> {
        conf.verify_compiled_kernels = parse_bool(Self::NAME, value)?;
        Ok(())
    }

    fn get_as_string(conf: &ExecutionConfig) -> String {
        conf.verify_compiled_kernels.to_string()
    }
}

pub struct ValidateNestedSizesAfterFlatten;

impl ExecutionSetting for ValidateNestedSizesAfterFlatten {
    const NAME: &'static str = "validate_nested_sizes_after_flatten";
    const DESCRIPTION: &'static str = "Validate nested array sizes on the output of flatten";

    fn set_from_str(value: &str, conf: &mut ExecutionConfig) -> Result<()> {
        conf.validate_nested_sizes_after_flatten = parse_bool(Self::NAME, value)?;
        Ok(())
    }

    fn get_as_string(conf: &ExecutionConfig) -> String {
        conf.validate_nested_sizes_after_flatten.to_string()
    }
}
