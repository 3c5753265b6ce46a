use clap::{Parser, Subcommand};
use hmmsub::batch;
use hmmsub::error::HmmError;
use hmmsub::hmm::Hmm;
use hmmsub::model::{matrix_to_rows, read_emissions, ModelParams};
use hmmsub::utils::timer;
use log::{error, info, warn};
use ndarray::Array1;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[clap(author, about, version)]
struct Opts {
    /// Number of worker threads (default: number of cores)
    #[clap(short = 't', long)]
    threads: Option<usize>,
    #[clap(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Most probable state path of each sequence
    ///
    /// A sub-HMM is decoded over its materialized transition matrix.
    Decode {
        /// Model JSON filename
        #[clap(short, long)]
        model: PathBuf,
        /// Emission log likelihoods JSON filename (list of T x M matrices)
        #[clap(short, long)]
        input: PathBuf,
    },
    /// Log likelihood of each sequence
    Loglik {
        /// Model JSON filename
        #[clap(short, long)]
        model: PathBuf,
        /// Emission log likelihoods JSON filename (list of T x M matrices)
        #[clap(short, long)]
        input: PathBuf,
    },
    /// Posterior samples of the state path of each sequence
    Sample {
        /// Model JSON filename
        #[clap(short, long)]
        model: PathBuf,
        /// Emission log likelihoods JSON filename (list of T x M matrices)
        #[clap(short, long)]
        input: PathBuf,
        /// Seed of the random number generator
        #[clap(short, long, default_value_t = 0)]
        seed: u64,
        /// Number of samples per sequence
        #[clap(short, long, default_value_t = 1)]
        n_samples: usize,
    },
    /// Smoothed posteriors of each sequence, as JSON
    Posterior {
        /// Model JSON filename
        #[clap(short, long)]
        model: PathBuf,
        /// Emission log likelihoods JSON filename (list of T x M matrices)
        #[clap(short, long)]
        input: PathBuf,
    },
}

fn format_path(path: &Array1<usize>) -> String {
    path.iter()
        .map(|k| k.to_string())
        .collect::<Vec<_>>()
        .join(",")
}

fn run(opts: &Opts) -> Result<(), HmmError> {
    match &opts.command {
        Commands::Decode { model, input } => {
            let abls = read_emissions(input)?;
            let (trans, init) = match ModelParams::from_json_file(model)? {
                ModelParams::Flat(params) => (params.trans, params.init),
                ModelParams::Sub(params) => {
                    let model = params.view()?;
                    (model.to_dense(), model.init_distn())
                }
            };
            let hmm = Hmm::new(trans.view(), init.view())?;
            for (i, (path, score)) in batch::viterbi_paths(&hmm, &abls)?.iter().enumerate() {
                println!("{}\t{}\t{}", i, score, format_path(path));
            }
        }
        Commands::Loglik { model, input } => {
            let abls = read_emissions(input)?;
            let lls = match ModelParams::from_json_file(model)? {
                ModelParams::Flat(params) => batch::log_likelihoods(&params.view()?, &abls)?,
                ModelParams::Sub(params) => batch::subhmm_log_likelihoods(&params.view()?, &abls)?,
            };
            for (i, ll) in lls.iter().enumerate() {
                println!("{}\t{}", i, ll);
            }
            println!("#total\t{}", lls.iter().sum::<f64>());
        }
        Commands::Sample {
            model,
            input,
            seed,
            n_samples,
        } => {
            let abls = read_emissions(input)?;
            let params = ModelParams::from_json_file(model)?;
            for s in 0..*n_samples {
                // every (sample, sequence) pair gets its own seed
                let seed_s = seed.wrapping_add((s * abls.len()) as u64);
                let paths = match &params {
                    ModelParams::Flat(p) => batch::sample_paths(&p.view()?, &abls, seed_s)?,
                    ModelParams::Sub(p) => batch::subhmm_sample_paths(&p.view()?, &abls, seed_s)?,
                };
                for (i, path) in paths.iter().enumerate() {
                    println!("{}\t{}\t{}", s, i, format_path(path));
                }
            }
        }
        Commands::Posterior { model, input } => {
            let abls = read_emissions(input)?;
            let posteriors = match ModelParams::from_json_file(model)? {
                ModelParams::Flat(params) => batch::posteriors(&params.view()?, &abls)?,
                ModelParams::Sub(params) => {
                    let model = params.view()?;
                    abls.iter()
                        .map(|abl| model.expectations(abl.view()))
                        .collect::<Result<Vec<_>, _>>()?
                }
            };
            let rows: Vec<Vec<Vec<f64>>> = posteriors.iter().map(matrix_to_rows).collect();
            println!("{}", serde_json::to_string(&rows)?);
        }
    }
    Ok(())
}

fn main() {
    env_logger::init();
    let opts: Opts = Opts::parse();
    if let Some(n) = opts.threads {
        if let Err(e) = rayon::ThreadPoolBuilder::new()
            .num_threads(n)
            .build_global()
        {
            warn!("could not set the number of threads: {}", e);
        }
    }
    info!("n_threads={}", rayon::current_num_threads());
    info!("opts={:?}", opts);
    let (result, elapsed) = timer(|| run(&opts));
    info!("elapsed={}ms", elapsed);
    if let Err(e) = result {
        error!("{}", e);
        eprintln!("error: {}", e);
        std::process::exit(1);
    }
}
