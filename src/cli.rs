use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::config::AcidConfig;
use crate::grammar::{classify, AcidPath};
use crate::listing::list_files_recursive;
use crate::metrics::{SkipCounts, SkipStats};
use crate::oracle::{AllValid, TxnValidity, ValidTxnList, ValidWriteIdList};
use crate::props::{
    is_full_acid_table, is_insert_only_table, is_transactional_table,
    set_transactional_properties, TransactionalType,
};
use crate::resolver::{relativize, AcidFileFilter};

#[derive(Parser, Debug)]
#[command(
    name = "acidlens",
    version,
    about = "Resolve which files of an ACID table directory a snapshot reads",
    arg_required_else_help = true
)]
pub struct Cli {
    #[command(subcommand)]
    cmd: Cmd,
}

#[derive(Subcommand, Debug)]
pub enum Cmd {
    /// Show how relative paths classify (base / delta / delete_delta / unclassified)
    Classify {
        /// Paths relative to the table/partition root
        #[arg(required = true)]
        paths: Vec<String>,
        #[arg(long)]
        json: bool,
    },
    /// List a partition directory and print the files visible to a snapshot
    Resolve {
        #[arg(long)]
        root: PathBuf,
        /// Write id list: "table:hwm:minOpen:open:aborted" or a JSON object
        #[arg(long)]
        write_ids: String,
        /// Transaction list: "hwm:minOpen:open:aborted" or a JSON object.
        /// Without it every visibility transaction counts as committed.
        #[arg(long)]
        txns: Option<String>,
        #[arg(long)]
        json: bool,
    },
    /// Apply the default transactional mode to table properties and print the flags
    Props {
        /// key=value, repeatable
        #[arg(long = "prop", value_parser = parse_prop)]
        props: Vec<(String, String)>,
        /// none | insert_only (default: ACID_DEFAULT_TRANSACTIONAL_TYPE)
        #[arg(long)]
        default_type: Option<TransactionalType>,
        #[arg(long)]
        json: bool,
    },
}

fn parse_prop(s: &str) -> Result<(String, String)> {
    let (k, v) = s
        .split_once('=')
        .ok_or_else(|| anyhow!("property '{s}' must be key=value"))?;
    Ok((k.trim().to_string(), v.trim().to_string()))
}

/// Parse an oracle from its Hive string form or from JSON.
fn parse_oracle<T>(s: &str, what: &str) -> Result<T>
where
    T: std::str::FromStr<Err = anyhow::Error> + serde::de::DeserializeOwned,
{
    let s = s.trim();
    if s.starts_with('{') {
        serde_json::from_str(s).with_context(|| format!("parse {what} JSON"))
    } else {
        s.parse::<T>().with_context(|| format!("parse {what}"))
    }
}

pub fn run() -> Result<()> {
    let cli = Cli::parse();
    match cli.cmd {
        Cmd::Classify { paths, json } => cmd_classify(&paths, json),
        Cmd::Resolve {
            root,
            write_ids,
            txns,
            json,
        } => cmd_resolve(&root, &write_ids, txns.as_deref(), json),
        Cmd::Props {
            props,
            default_type,
            json,
        } => cmd_props(props, default_type, json),
    }
}

#[derive(Serialize)]
struct Classified<'a> {
    path: &'a str,
    class: AcidPath,
}

pub fn cmd_classify(paths: &[String], json: bool) -> Result<()> {
    let rows: Vec<Classified> = paths
        .iter()
        .map(|p| Classified {
            path: p,
            class: classify(p),
        })
        .collect();

    if json {
        println!("{}", serde_json::to_string_pretty(&rows)?);
    } else {
        for r in &rows {
            println!("{:<48} {}", r.path, r.class);
        }
    }
    Ok(())
}

#[derive(Debug, Serialize)]
pub struct ResolveReport {
    pub root: String,
    pub files: Vec<String>,
    pub bytes: u64,
    pub skipped: SkipCounts,
}

/// List `root`, resolve it and return the report (no printing).
pub fn resolve_dir(
    root: &Path,
    write_ids: &str,
    txns: Option<&str>,
    cfg: &AcidConfig,
) -> Result<ResolveReport> {
    let write_ids: ValidWriteIdList = parse_oracle(write_ids, "write id list")?;
    let txn_list: Option<ValidTxnList> = txns
        .map(|s| parse_oracle(s, "txn list"))
        .transpose()?;
    let txns: &dyn TxnValidity = match &txn_list {
        Some(t) => t,
        None => &AllValid,
    };

    let listing = list_files_recursive(root)?;
    let stats = SkipStats::new();
    let kept = AcidFileFilter::new(txns, &write_ids)
        .with_stats(&stats)
        .with_config(cfg)
        .filter(&listing, root)
        .with_context(|| format!("resolve {}", root.display()))?;

    Ok(ResolveReport {
        root: root.display().to_string(),
        bytes: kept.iter().map(|f| f.len).sum(),
        files: kept.iter().map(|f| relativize(&f.path, root)).collect(),
        skipped: stats.snapshot(),
    })
}

pub fn cmd_resolve(root: &Path, write_ids: &str, txns: Option<&str>, json: bool) -> Result<()> {
    let cfg = AcidConfig::from_env();
    let rep = resolve_dir(root, write_ids, txns, &cfg)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&rep)?);
    } else {
        println!("Snapshot files under {}", rep.root);
        for f in &rep.files {
            println!("  {f}");
        }
        println!("  files        = {}", rep.files.len());
        println!("  bytes        = {}", rep.bytes);
        println!("  uncommitted  = {}", rep.skipped.uncommitted_files_skipped);
        println!("  superseded   = {}", rep.skipped.files_superseded_by_newer_base);
    }
    Ok(())
}

#[derive(Debug, Serialize)]
pub struct PropsReport {
    pub properties: HashMap<String, String>,
    pub modified: bool,
    pub transactional: bool,
    pub insert_only: bool,
    pub full_acid: bool,
}

pub fn props_report(
    props: Vec<(String, String)>,
    default_type: TransactionalType,
) -> PropsReport {
    let mut properties: HashMap<String, String> = props.into_iter().collect();
    let modified = set_transactional_properties(&mut properties, default_type);
    PropsReport {
        transactional: is_transactional_table(&properties),
        insert_only: is_insert_only_table(&properties),
        full_acid: is_full_acid_table(&properties),
        properties,
        modified,
    }
}

pub fn cmd_props(
    props: Vec<(String, String)>,
    default_type: Option<TransactionalType>,
    json: bool,
) -> Result<()> {
    let default_type =
        default_type.unwrap_or_else(|| AcidConfig::from_env().default_transactional_type);
    let rep = props_report(props, default_type);

    if json {
        println!("{}", serde_json::to_string_pretty(&rep)?);
    } else {
        let mut keys: Vec<_> = rep.properties.iter().collect();
        keys.sort();
        for (k, v) in keys {
            println!("  {k} = {v}");
        }
        println!("  modified      = {}", rep.modified);
        println!("  transactional = {}", rep.transactional);
        println!("  insert_only   = {}", rep.insert_only);
        println!("  full_acid     = {}", rep.full_acid);
    }
    Ok(())
}
