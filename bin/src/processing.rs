use std::collections::HashMap;
use std::path::{self, Path, PathBuf};
use anyhow::bail;
use whiteout::pipeline::{process_logo, ExportOptions, LogoJob, LogoOutcome};
use whiteout::BackgroundRemover;
use crate::config::Config;

pub(crate) const DEFAULT_BATCH_OUTPUT: &str = "output";

pub(crate) struct Processor {
    config: Config,
    remover: BackgroundRemover,
}

impl Processor {

    pub(crate) fn new(config: Config) -> whiteout::Result<Self> {
        let remover = BackgroundRemover::new(config.removal.clone())?;
        Ok(Processor { config, remover })
    }

    pub(crate) fn process(&self, job: &LogoJob) -> whiteout::Result<LogoOutcome> {
        process_logo(job, &self.remover, &self.export_options())
    }

    fn export_options(&self) -> ExportOptions {
        ExportOptions {
            mode: self.config.input.mode,
            thumbnail_size: self.config.output.thumbnail_size,
            compression: self.config.output.compression,
        }
    }

    /// Job for a single input: explicit paths, or `<stem>-transparent.png` beside the input.
    pub(crate) fn single_job(&self, input: &Path) -> LogoJob {
        let output = self
            .config
            .output
            .output
            .clone()
            .unwrap_or_else(|| input.with_file_name(format!("{}-transparent.png", asset_name(input))));
        let mask = self
            .config
            .output
            .save_mask
            .then(|| output.with_file_name(format!("{}_mask.png", asset_name(&output))));
        LogoJob {
            input: input.to_path_buf(),
            output,
            thumbnail: self.config.output.thumbnail.clone(),
            mask,
        }
    }

    /// Job for one file of a batch, writing into the output folder.
    pub(crate) fn batch_job(&self, input: &Path) -> LogoJob {
        let output_folder = self.output_folder();
        let name = asset_name(input);
        LogoJob {
            input: input.to_path_buf(),
            output: output_folder.join(format!("{}.png", name)),
            thumbnail: self
                .config
                .output
                .thumbnails
                .then(|| output_folder.join("thumbnails").join(format!("{}.png", name))),
            mask: self
                .config
                .output
                .save_mask
                .then(|| output_folder.join(format!("{}_mask.png", name))),
        }
    }

    /// Jobs for a whole batch, refusing to run when two inputs would write
    /// the same file or when any output would land on an input.
    pub(crate) fn batch_jobs(&self, inputs: &[PathBuf]) -> anyhow::Result<Vec<LogoJob>> {
        let jobs: Vec<LogoJob> = inputs.iter().map(|input| self.batch_job(input)).collect();

        let mut claimed: HashMap<PathBuf, &Path> = HashMap::new();
        for input in inputs {
            claimed.insert(path::absolute(input)?, input);
        }
        for job in &jobs {
            let destinations = std::iter::once(&job.output)
                .chain(job.thumbnail.iter())
                .chain(job.mask.iter());
            for destination in destinations {
                let key = path::absolute(destination)?;
                if let Some(owner) = claimed.get(&key) {
                    if path::absolute(owner)? == key {
                        bail!(
                            "Output {} for {} would overwrite an input file",
                            destination.display(),
                            job.input.display()
                        );
                    }
                    bail!(
                        "{} and {} would both write {}",
                        owner.display(),
                        job.input.display(),
                        destination.display()
                    );
                }
                claimed.insert(key, &job.input);
            }
        }
        Ok(jobs)
    }

    pub(crate) fn output_folder(&self) -> PathBuf {
        self.config
            .output
            .output
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_BATCH_OUTPUT))
    }
}

fn asset_name(path: &Path) -> String {
    path.file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| "logo".to_string())
}
