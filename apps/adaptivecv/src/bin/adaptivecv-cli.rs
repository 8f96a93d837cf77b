use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{Parser, ValueEnum};
use serde_json::{json, Value};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use adaptivecv::config::Config;
use adaptivecv::extraction::ContentExtractor;
use adaptivecv::pipeline::{
    DocumentPipeline, JobDetails, JobSource, PipelineInput, UserDataSource,
};
use adaptivecv::state::{build_pipeline, build_scorer};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Mode {
    /// Every stage, printing the run report
    Full,
    /// Only load and parse the candidate data
    UserData,
    /// Only parse the job posting
    JobDetails,
    /// Candidate data, job details and the tailored resume
    Resume,
    /// Candidate data, job details and the cover letter
    CoverLetter,
    /// Build the resume, then score it
    Metrics,
}

#[derive(Parser)]
#[command(name = "adaptivecv-cli")]
#[command(about = "Tailor a resume and cover letter to a job posting")]
struct Cli {
    /// URL of the job posting
    #[arg(long)]
    job_url: Option<String>,

    /// File holding the job description text (used when no URL is given)
    #[arg(long)]
    job_text_file: Option<PathBuf>,

    /// Resume PDF, profile JSON or URL; the demo profile when omitted
    #[arg(long)]
    user_data: Option<String>,

    #[arg(long, env = "OUTPUT_DIR")]
    output_dir: Option<PathBuf>,

    #[arg(long, env = "LLM_MODEL")]
    model: Option<String>,

    /// API key, or `os` to read OPENAI_API_KEY
    #[arg(long, default_value = "os")]
    api_key: String,

    #[arg(long, value_enum, default_value_t = Mode::Full)]
    mode: Mode,
}

impl Cli {
    fn job_source(&self) -> Result<JobSource> {
        if let Some(url) = self.job_url.as_deref().filter(|u| !u.trim().is_empty()) {
            return Ok(JobSource::Url(url.trim().to_string()));
        }
        match &self.job_text_file {
            Some(path) => {
                let text = std::fs::read_to_string(path)
                    .with_context(|| format!("failed to read {}", path.display()))?;
                Ok(JobSource::Text(text))
            }
            None => bail!("either --job-url or --job-text-file is required for this mode"),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let api_key = (cli.api_key != "os").then(|| cli.api_key.clone());
    let mut config = Config::load(api_key)?;
    if let Some(dir) = &cli.output_dir {
        config.output_dir = dir.clone();
    }
    if let Some(model) = &cli.model {
        config.llm_model = model.clone();
    }

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let content = Arc::new(ContentExtractor::standard(&config.chrome_bin)?);
    let pipeline = build_pipeline(&config, content, build_scorer(&config))?;

    info!("Running in {:?} mode with model {}", cli.mode, config.llm_model);
    let output = run_mode(&cli, &pipeline).await?;
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

async fn run_mode(cli: &Cli, pipeline: &DocumentPipeline) -> Result<Value> {
    let user_source = UserDataSource::parse(cli.user_data.as_deref());

    let value = match cli.mode {
        Mode::Full => {
            let input = PipelineInput {
                job: cli.job_source()?,
                user_data: user_source,
            };
            serde_json::to_value(pipeline.run(&input).await?)?
        }
        Mode::UserData => pipeline.load_user_data(&user_source).await?,
        Mode::JobDetails => {
            let job = pipeline.extract_job_details(&cli.job_source()?).await?;
            json!({
                "job_details": job.details,
                "path": job.path,
            })
        }
        Mode::Resume => {
            let (user, job) = user_and_job(cli, pipeline, &user_source).await?;
            let resume = pipeline.build_resume(&job.details, &user).await?;
            json!({
                "resume": resume.resume,
                "json_path": resume.json_path,
                "pdf_path": resume.pdf_path,
            })
        }
        Mode::CoverLetter => {
            let (user, job) = user_and_job(cli, pipeline, &user_source).await?;
            let letter = pipeline.write_cover_letter(&job.details, &user).await?;
            json!({
                "cover_letter": letter.text,
                "text_path": letter.text_path,
                "pdf_path": letter.pdf_path,
            })
        }
        Mode::Metrics => {
            let (user, job) = user_and_job(cli, pipeline, &user_source).await?;
            let resume = pipeline.build_resume(&job.details, &user).await?;
            let metrics = pipeline.score(&resume.resume, &user, &job.details).await?;
            serde_json::to_value(metrics)?
        }
    };
    Ok(value)
}

async fn user_and_job(
    cli: &Cli,
    pipeline: &DocumentPipeline,
    user_source: &UserDataSource,
) -> Result<(Value, JobDetails)> {
    let user = pipeline.load_user_data(user_source).await?;
    let job = pipeline.extract_job_details(&cli.job_source()?).await?;
    Ok((user, job))
}
