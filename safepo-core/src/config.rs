//! Untyped configuration mappings handed to the external trainer.
//!
//! The hyperparameter schemas belong to the trainer, so the files are kept as
//! YAML mappings and only the keys set by the builder are touched.
use crate::error::SafepoError;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use serde_yaml::{Mapping, Value};
use std::{
    fs::File,
    io::{BufReader, Write},
    path::Path,
};

fn load_mapping(path: &Path) -> Result<Mapping> {
    let file = File::open(path).with_context(|| format!("Failed to open {}", path.display()))?;
    let rdr = BufReader::new(file);
    let value: Value = serde_yaml::from_reader(rdr)
        .with_context(|| format!("Failed to parse {}", path.display()))?;
    match value {
        Value::Mapping(m) => Ok(m),
        Value::Null => Ok(Mapping::new()),
        _ => Err(SafepoError::NotAMapping(path.display().to_string()).into()),
    }
}

fn save_mapping(mapping: &Mapping, path: &Path) -> Result<()> {
    let mut file = File::create(path)?;
    file.write_all(serde_yaml::to_string(mapping)?.as_bytes())?;
    Ok(())
}

macro_rules! impl_mapping_config {
    ($name:ident) => {
        impl $name {
            /// Loads the mapping from a YAML file.
            pub fn load(path: impl AsRef<Path>) -> Result<Self> {
                Ok(Self(load_mapping(path.as_ref())?))
            }

            /// Saves the mapping to a YAML file.
            pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
                save_mapping(&self.0, path.as_ref())
            }

            /// Returns the value of a key.
            pub fn get(&self, key: &str) -> Option<&Value> {
                self.0.get(&Value::from(key))
            }

            /// Returns `true` if the key exists.
            pub fn contains_key(&self, key: &str) -> bool {
                self.0.contains_key(&Value::from(key))
            }

            /// Sets the value of a key, returning the previous one.
            pub fn insert(&mut self, key: &str, value: impl Into<Value>) -> Option<Value> {
                self.0.insert(Value::from(key), value.into())
            }

            /// The underlying mapping.
            pub fn as_mapping(&self) -> &Mapping {
                &self.0
            }

            /// Serializes the mapping to a YAML string.
            pub fn to_yaml(&self) -> Result<String> {
                Ok(serde_yaml::to_string(&self.0)?)
            }
        }

        impl From<Mapping> for $name {
            fn from(mapping: Mapping) -> Self {
                Self(mapping)
            }
        }
    };
}

/// Hyperparameters of a training run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TrainConfig(Mapping);

impl_mapping_config!(TrainConfig);

impl TrainConfig {
    /// Merges the nested mapping under `section` into the top level.
    ///
    /// Keys of the section overwrite top-level keys of the same name.
    pub fn merge_section(&mut self, section: &str) -> Result<()> {
        let nested = match self.get(section) {
            Some(Value::Mapping(m)) => m.clone(),
            Some(_) => return Err(SafepoError::NotAMapping(section.to_string()).into()),
            None => {
                return Err(SafepoError::MissingSection {
                    section: section.to_string(),
                    file: "train config".to_string(),
                }
                .into())
            }
        };
        for (k, v) in nested {
            self.0.insert(k, v);
        }
        Ok(())
    }

    /// Log directory of the run, if already set.
    pub fn log_dir(&self) -> Option<&str> {
        self.get("log_dir").and_then(Value::as_str)
    }
}

/// Parameters of a simulator task.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EnvConfig(Mapping);

impl_mapping_config!(EnvConfig);

impl EnvConfig {
    /// Fills `task.randomize`.
    ///
    /// A missing key takes `randomize`, an existing one is reset to `false`,
    /// and a missing `task` section is created with randomization off.
    pub fn fill_randomize(&mut self, randomize: bool) -> Result<()> {
        let key = Value::from("task");
        match self.0.get_mut(&key) {
            Some(Value::Mapping(task)) => {
                let k = Value::from("randomize");
                let v = !task.contains_key(&k) && randomize;
                task.insert(k, Value::from(v));
            }
            Some(_) => return Err(SafepoError::NotAMapping("task".to_string()).into()),
            None => {
                let mut task = Mapping::new();
                task.insert(Value::from("randomize"), Value::from(false));
                self.0.insert(key, Value::Mapping(task));
            }
        }
        Ok(())
    }

    /// The `sim` section, if any.
    pub fn sim_section(&self) -> Option<&Value> {
        self.get("sim")
    }
}
