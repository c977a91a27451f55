use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Arg, ArgMatches, Command, ValueHint};
use log::LevelFilter;

use rulelab_learners::config::LearnerParameters;
use rulelab_learners::expression::parse_arguments;
use rulelab_learners::models::PrintOptions;

/// Builds the command line interface of the `rulelab` binary.
pub fn cli() -> Command {
    Command::new("rulelab")
        .version(clap::crate_version!())
        .about("Run cross-validation experiments with multi-label rule learners")
        .arg(
            Arg::new("log_level")
                .long("log-level")
                .help("The log level to be used [debug, info, warn, error, critical, notset]")
                .default_value("info")
                .value_hint(ValueHint::Other),
        )
        .arg(
            Arg::new("config")
                .long("config")
                .help(
                    "Path to a JSON file with learner parameters. \
                     Parameters given on the command line take precedence.",
                )
                .value_parser(clap::value_parser!(PathBuf))
                .value_hint(ValueHint::FilePath),
        )
        .arg(
            Arg::new("data_dir")
                .long("data-dir")
                .help("The path of the directory where the data sets are located")
                .required(true)
                .value_parser(clap::value_parser!(PathBuf))
                .value_hint(ValueHint::DirPath),
        )
        .arg(
            Arg::new("dataset")
                .long("dataset")
                .help("The name of the data set to be used, i.e. <data-dir>/<dataset>.csv")
                .required(true)
                .value_parser(clap::builder::NonEmptyStringValueParser::new()),
        )
        .arg(
            Arg::new("output_dir")
                .long("output-dir")
                .help("The path of the directory into which results should be written or 'none'")
                .value_parser(parse_optional_path)
                .value_hint(ValueHint::DirPath),
        )
        .arg(
            Arg::new("model_dir")
                .long("model-dir")
                .help("The path of the directory where models should be saved or 'none'")
                .value_parser(parse_optional_path)
                .value_hint(ValueHint::DirPath),
        )
        .arg(
            Arg::new("label_columns")
                .long("label-columns")
                .help("Comma-separated names of the label columns. Defaults to the last column.")
                .value_delimiter(','),
        )
        .arg(
            Arg::new("nominal_columns")
                .long("nominal-columns")
                .help("Comma-separated names of the nominal feature columns")
                .value_delimiter(','),
        )
        .arg(
            Arg::new("folds")
                .long("folds")
                .help("The number of cross-validation folds, 1 to train on the whole data set")
                .default_value("1")
                .value_parser(clap::value_parser!(usize)),
        )
        .arg(
            Arg::new("current_fold")
                .long("current-fold")
                .help("The only cross-validation fold to be run, starting at 0, or -1 to run all folds")
                .default_value("-1")
                .allow_negative_numbers(true)
                .value_parser(clap::value_parser!(i64)),
        )
        .arg(
            Arg::new("random_state")
                .long("random-state")
                .help("The seed to be used by RNGs [default: 1]")
                .allow_negative_numbers(true)
                .value_parser(clap::value_parser!(i64)),
        )
        .arg(
            Arg::new("feature_format")
                .long("feature-format")
                .help("The format to be used for the feature matrix [auto, sparse, dense]")
                .value_parser(["auto", "sparse", "dense"]),
        )
        .arg(
            Arg::new("num_threads_refinement")
                .long("num-threads-refinement")
                .help("The number of threads used to search for refinements of rules or -1 [default: 1]")
                .allow_negative_numbers(true)
                .value_parser(clap::value_parser!(i64)),
        )
        .arg(
            Arg::new("max_rules")
                .long("max-rules")
                .help("The maximum number of rules to be induced or -1 [default: 50]")
                .allow_negative_numbers(true)
                .value_parser(clap::value_parser!(i64)),
        )
        .arg(
            Arg::new("time_limit")
                .long("time-limit")
                .help("The duration in seconds after which the induction of rules is canceled or -1 [default: -1]")
                .allow_negative_numbers(true)
                .value_parser(clap::value_parser!(i64)),
        )
        .arg(
            Arg::new("feature_sub_sampling")
                .long("feature-sub-sampling")
                .help("The strategy used for feature sub-sampling, e.g. random-feature-selection{'sample_size': 0.5}, or 'none'"),
        )
        .arg(
            Arg::new("min_support")
                .long("min-support")
                .help("The minimum fraction of examples a rule must cover [default: 0.0001]")
                .value_parser(clap::value_parser!(f32)),
        )
        .arg(
            Arg::new("max_conditions")
                .long("max-conditions")
                .help("The maximum number of conditions in a rule's body or -1 [default: -1]")
                .allow_negative_numbers(true)
                .value_parser(clap::value_parser!(i64)),
        )
        .arg(
            Arg::new("print_rules")
                .long("print-rules")
                .help("True, if the induced rules should be logged, False otherwise")
                .default_value("true")
                .value_parser(parse_bool),
        )
        .arg(
            Arg::new("print_options")
                .long("print-options")
                .help("A mapping of options for printing rules, e.g. {'print_feature_names': False}"),
        )
        .arg(
            Arg::new("store_rules")
                .long("store-rules")
                .help("True, if the induced rules should be stored in text files, False otherwise")
                .default_value("true")
                .value_parser(parse_bool),
        )
        .arg(
            Arg::new("store_predictions")
                .long("store-predictions")
                .help("True, if the predictions should be stored in CSV files, False otherwise")
                .default_value("true")
                .value_parser(parse_bool),
        )
}

/// Accepts `true` or `false`, ignoring case.
pub fn parse_bool(s: &str) -> std::result::Result<bool, String> {
    match s.to_lowercase().as_str() {
        "true" => Ok(true),
        "false" => Ok(false),
        _ => Err(format!("Invalid boolean argument given: {}", s)),
    }
}

fn is_none(s: &str) -> bool {
    s.eq_ignore_ascii_case("none")
}

fn parse_optional_path(s: &str) -> std::result::Result<Option<PathBuf>, String> {
    if is_none(s) {
        Ok(None)
    } else {
        Ok(Some(PathBuf::from(s)))
    }
}

pub fn parse_log_level(s: &str) -> Result<LevelFilter> {
    match s.to_lowercase().as_str() {
        "debug" => Ok(LevelFilter::Debug),
        "info" => Ok(LevelFilter::Info),
        "warn" | "warning" => Ok(LevelFilter::Warn),
        "error" | "critical" | "fatal" => Ok(LevelFilter::Error),
        "notset" => Ok(LevelFilter::Trace),
        _ => anyhow::bail!("Invalid argument given for parameter '--log-level': {}", s),
    }
}

/// Prefix of the model name. Models trained on a different selection of label
/// or nominal columns of the same data set get different names.
pub fn model_name_prefix(
    dataset: &str,
    label_columns: Option<&[String]>,
    nominal_columns: &[String],
) -> String {
    let mut prefix = dataset.to_string();
    if let Some(label_columns) = label_columns {
        prefix.push_str(&format!("_labels={}", label_columns.join(",")));
    }
    if !nominal_columns.is_empty() {
        prefix.push_str(&format!("_nominal={}", nominal_columns.join(",")));
    }
    prefix
}

/// Everything needed to run one experiment.
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub data_dir: PathBuf,
    pub dataset: String,
    pub output_dir: Option<PathBuf>,
    pub model_dir: Option<PathBuf>,
    /// `None` to use the last column.
    pub label_columns: Option<Vec<String>>,
    pub nominal_columns: Vec<String>,
    pub folds: usize,
    pub current_fold: Option<usize>,
    pub print_rules: bool,
    pub print_options: PrintOptions,
    pub store_rules: bool,
    pub store_predictions: bool,
    pub params: LearnerParameters,
}

impl RunConfig {
    /// Reads the optional JSON parameter file, applies the command line
    /// overrides and checks that the data set exists.
    pub fn from_arguments(matches: &ArgMatches) -> Result<Self> {
        let mut params = match matches.get_one::<PathBuf>("config") {
            Some(config_path) => {
                let config_json = fs::read_to_string(config_path)
                    .with_context(|| format!("Failed to read config file: {:?}", config_path))?;
                serde_json::from_str::<LearnerParameters>(&config_json)
                    .with_context(|| format!("Failed to parse config file: {:?}", config_path))?
            }
            None => LearnerParameters::default(),
        };

        // Apply CLI overrides
        if let Some(&random_state) = matches.get_one::<i64>("random_state") {
            params.random_state = random_state;
        }
        if let Some(feature_format) = matches.get_one::<String>("feature_format") {
            params.feature_format = feature_format.clone();
        }
        if let Some(&num_threads) = matches.get_one::<i64>("num_threads_refinement") {
            params.num_threads_refinement = num_threads;
        }
        if let Some(&max_rules) = matches.get_one::<i64>("max_rules") {
            params.max_rules = max_rules;
        }
        if let Some(&time_limit) = matches.get_one::<i64>("time_limit") {
            params.time_limit = time_limit;
        }
        if let Some(feature_sub_sampling) = matches.get_one::<String>("feature_sub_sampling") {
            params.feature_sub_sampling = if is_none(feature_sub_sampling) {
                None
            } else {
                Some(feature_sub_sampling.clone())
            };
        }
        if let Some(&min_support) = matches.get_one::<f32>("min_support") {
            params.min_support = min_support;
        }
        if let Some(&max_conditions) = matches.get_one::<i64>("max_conditions") {
            params.max_conditions = max_conditions;
        }

        let data_dir = matches
            .get_one::<PathBuf>("data_dir")
            .cloned()
            .context("Missing mandatory argument --data-dir")?;
        let dataset = matches
            .get_one::<String>("dataset")
            .cloned()
            .context("Missing mandatory argument --dataset")?;
        let label_columns: Option<Vec<String>> = matches
            .get_many::<String>("label_columns")
            .map(|values| values.cloned().collect());
        let nominal_columns: Vec<String> = matches
            .get_many::<String>("nominal_columns")
            .map(|values| values.cloned().collect())
            .unwrap_or_default();
        params.name_prefix = Some(model_name_prefix(
            &dataset,
            label_columns.as_deref(),
            &nominal_columns,
        ));

        let current_fold = match matches.get_one::<i64>("current_fold").copied().unwrap_or(-1) {
            -1 => None,
            k if k >= 0 => Some(k as usize),
            k => anyhow::bail!("Invalid argument given for parameter '--current-fold': {}", k),
        };

        let print_options = match matches.get_one::<String>("print_options") {
            Some(s) if !is_none(s) => PrintOptions::from_arguments(
                &parse_arguments(s).context("Failed to parse --print-options")?,
            ),
            _ => PrintOptions::default(),
        };

        let config = RunConfig {
            data_dir,
            dataset,
            output_dir: matches.get_one::<Option<PathBuf>>("output_dir").cloned().flatten(),
            model_dir: matches.get_one::<Option<PathBuf>>("model_dir").cloned().flatten(),
            label_columns,
            nominal_columns,
            folds: matches.get_one::<usize>("folds").copied().unwrap_or(1),
            current_fold,
            print_rules: matches.get_one::<bool>("print_rules").copied().unwrap_or(true),
            print_options,
            store_rules: matches.get_one::<bool>("store_rules").copied().unwrap_or(true),
            store_predictions: matches.get_one::<bool>("store_predictions").copied().unwrap_or(true),
            params,
        };

        config.validate_data_set()?;
        Ok(config)
    }

    /// `<data-dir>/<dataset>.csv`
    pub fn dataset_file(&self) -> PathBuf {
        self.data_dir.join(format!("{}.csv", self.dataset))
    }

    fn validate_data_set(&self) -> Result<()> {
        if !self.data_dir.is_dir() {
            anyhow::bail!("Data directory does not exist: {:?}", self.data_dir);
        }

        let dataset_file = self.dataset_file();
        if !dataset_file.is_file() {
            anyhow::bail!("Data set file does not exist: {:?}", dataset_file);
        }

        Ok(())
    }
}
