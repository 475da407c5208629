use std::path::PathBuf;

use anyhow::Result;
use chrono::NaiveDate;
use pico_args::Arguments;

use crate::constants::DEFAULT_CONFIG_PATH;
use crate::storage::StorageFormat;

#[derive(Debug)]
pub struct FileArgs {
    pub config: PathBuf,
    pub format: StorageFormat,
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
    pub dest_dir: PathBuf,
    pub skip_zero: bool,
}

impl FileArgs {
    pub fn parse(mut args: Arguments) -> Result<Self> {
        Ok(Self {
            config: config_path(&mut args)?,
            format: args.value_from_str("--format")?,
            start: args.opt_value_from_str("--start")?,
            end: args.opt_value_from_str("--end")?,
            dest_dir: args
                .opt_value_from_str("--dir")?
                .unwrap_or_else(|| PathBuf::from(".")),
            skip_zero: args.contains("--skip-zero"),
        })
    }
}

#[derive(Debug)]
pub struct PvOutputArgs {
    pub config: PathBuf,
    pub date: Option<NaiveDate>,
}

impl PvOutputArgs {
    pub fn parse(mut args: Arguments) -> Result<Self> {
        Ok(Self {
            config: config_path(&mut args)?,
            date: args.opt_value_from_str("--date")?,
        })
    }
}

fn config_path(args: &mut Arguments) -> Result<PathBuf> {
    Ok(args
        .opt_value_from_str(["-c", "--config"])?
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH)))
}
