use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Sender};
use std::sync::Arc;
use std::{env, fs};

use anyhow::{bail, Context};
use qbank::api::{ImageUploader, QuestionKind, ResultsOverview, ResultsQuery, Scope};
use qbank::builder::{
    BuilderError, BuilderSession, EntryId, IdAssigner, ImageTarget, McqForm, McqRecord, PendingFile,
    QuestionForm, RearrangeForm, RearrangeRecord, Settled, TicketId, UploadEvent, Uploader,
};
use qbank::pagination::ListQuery;
use qbank::{ApiClient, ApiError, Config};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{info, warn};
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::prelude::*;
use tracing_subscriber::EnvFilter;

const BOLD: &str = "\x1b[1m";
const RESET: &str = "\x1b[0m";

const USAGE: &str = "Usage:
  qbank check <mcq|rearrange> <draft.json|draft.yaml>
  qbank push <mcq|rearrange> <draft> [--image <target>=<path>]...
  qbank list <mcqs|rearranges|coding> [page] [search]
  qbank results [test_id]

image targets: question, explanation, option:N, item:N (N counts from 1)";

/// Where a `--image` flag attaches its file, before entry positions are
/// resolved against the loaded form.
#[derive(Debug, PartialEq)]
enum ImageFlag {
    Question,
    Explanation,
    Entry(usize),
}

#[derive(Debug)]
enum Command {
    Check {
        kind: QuestionKind,
        draft: PathBuf,
    },
    Push {
        kind: QuestionKind,
        draft: PathBuf,
        images: Vec<(ImageFlag, PathBuf)>,
    },
    List {
        kind: QuestionKind,
        page: usize,
        search: Option<String>,
    },
    Results {
        test_id: Option<String>,
    },
}

fn parse_form_kind(value: Option<String>) -> anyhow::Result<QuestionKind> {
    let kind: QuestionKind = value
        .context("question kind is required")?
        .parse()
        .map_err(anyhow::Error::msg)?;
    if kind == QuestionKind::Coding {
        bail!("coding questions are not built from drafts");
    }
    Ok(kind)
}

fn parse_image(value: &str) -> anyhow::Result<(ImageFlag, PathBuf)> {
    let (target, path) = value
        .split_once('=')
        .with_context(|| format!("expected <target>=<path>, got '{}'", value))?;
    let flag = match target.split_once(':') {
        None if target == "question" => ImageFlag::Question,
        None if target == "explanation" => ImageFlag::Explanation,
        Some(("option" | "item", n)) => {
            let n: usize = n.parse().with_context(|| format!("bad position '{}'", n))?;
            if n == 0 {
                bail!("positions count from 1");
            }
            ImageFlag::Entry(n - 1)
        }
        _ => bail!("unknown image target '{}'", target),
    };
    Ok((flag, PathBuf::from(path)))
}

fn parse_command(mut args: impl Iterator<Item = String>) -> anyhow::Result<Command> {
    let command = args.next().context("a command is required")?;
    match command.as_str() {
        "check" => Ok(Command::Check {
            kind: parse_form_kind(args.next())?,
            draft: args.next().context("draft path is required")?.into(),
        }),
        "push" => {
            let kind = parse_form_kind(args.next())?;
            let draft = args.next().context("draft path is required")?.into();
            let mut images = Vec::new();
            while let Some(flag) = args.next() {
                if flag != "--image" {
                    bail!("unexpected argument '{}'", flag);
                }
                images.push(parse_image(&args.next().context("--image needs a value")?)?);
            }
            Ok(Command::Push { kind, draft, images })
        }
        "list" => {
            let kind = args
                .next()
                .context("question kind is required")?
                .parse()
                .map_err(anyhow::Error::msg)?;
            let page = match args.next() {
                Some(page) => page.parse().with_context(|| format!("bad page '{}'", page))?,
                None => 1,
            };
            Ok(Command::List {
                kind,
                page,
                search: args.next(),
            })
        }
        "results" => Ok(Command::Results { test_id: args.next() }),
        other => bail!("unknown command '{}'", other),
    }
}

fn read_draft<T: DeserializeOwned>(path: &Path) -> anyhow::Result<T> {
    let text = fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))?;
    let is_yaml = matches!(
        path.extension().and_then(|e| e.to_str()),
        Some("yaml" | "yml")
    );
    if is_yaml {
        serde_yaml_ng::from_str(&text).with_context(|| format!("invalid YAML draft {}", path.display()))
    } else {
        serde_json::from_str(&text).with_context(|| format!("invalid JSON draft {}", path.display()))
    }
}

/// The pieces of a form the push flow drives.
trait Draft: QuestionForm + Sized {
    type Record: DeserializeOwned;

    fn build(record: Self::Record) -> Self;

    fn remote(&self) -> Option<EntryId>;

    fn entry_id(&self, index: usize) -> Option<EntryId>;

    fn upload(
        &mut self,
        uploader: Arc<dyn Uploader>,
        target: ImageTarget,
        file: PendingFile,
        events: Sender<UploadEvent>,
    ) -> Result<TicketId, BuilderError>;

    fn apply(&mut self, event: UploadEvent) -> Result<Option<Settled>, BuilderError>;

    fn uploader(client: ApiClient) -> ImageUploader;

    fn submit(
        client: &ApiClient,
        scope: Scope,
        remote: Option<&EntryId>,
        payload: &Self::Payload,
    ) -> Result<serde_json::Value, ApiError>;
}

impl Draft for McqForm {
    type Record = McqRecord;

    fn build(record: McqRecord) -> Self {
        McqForm::from_record(record, IdAssigner::default())
    }

    fn remote(&self) -> Option<EntryId> {
        self.remote_id().cloned()
    }

    fn entry_id(&self, index: usize) -> Option<EntryId> {
        self.options().get(index).map(|e| e.id.clone())
    }

    fn upload(
        &mut self,
        uploader: Arc<dyn Uploader>,
        target: ImageTarget,
        file: PendingFile,
        events: Sender<UploadEvent>,
    ) -> Result<TicketId, BuilderError> {
        self.start_upload(uploader, target, file, events)
    }

    fn apply(&mut self, event: UploadEvent) -> Result<Option<Settled>, BuilderError> {
        self.apply_upload(event)
    }

    fn uploader(client: ApiClient) -> ImageUploader {
        ImageUploader::for_mcq(client)
    }

    fn submit(
        client: &ApiClient,
        scope: Scope,
        remote: Option<&EntryId>,
        payload: &Self::Payload,
    ) -> Result<serde_json::Value, ApiError> {
        match remote {
            Some(id) => client.update_mcq(scope, id.as_str(), payload),
            None => client.create_mcq(scope, payload),
        }
    }
}

impl Draft for RearrangeForm {
    type Record = RearrangeRecord;

    fn build(record: RearrangeRecord) -> Self {
        RearrangeForm::from_record(record, IdAssigner::default())
    }

    fn remote(&self) -> Option<EntryId> {
        self.remote_id().cloned()
    }

    fn entry_id(&self, index: usize) -> Option<EntryId> {
        self.items().get(index).map(|e| e.id.clone())
    }

    fn upload(
        &mut self,
        uploader: Arc<dyn Uploader>,
        target: ImageTarget,
        file: PendingFile,
        events: Sender<UploadEvent>,
    ) -> Result<TicketId, BuilderError> {
        self.start_upload(uploader, target, file, events)
    }

    fn apply(&mut self, event: UploadEvent) -> Result<Option<Settled>, BuilderError> {
        self.apply_upload(event)
    }

    fn uploader(client: ApiClient) -> ImageUploader {
        ImageUploader::for_rearrange(client)
    }

    fn submit(
        client: &ApiClient,
        scope: Scope,
        remote: Option<&EntryId>,
        payload: &Self::Payload,
    ) -> Result<serde_json::Value, ApiError> {
        match remote {
            Some(id) => client.update_rearrange(scope, id.as_str(), payload),
            None => client.create_rearrange(scope, payload),
        }
    }
}

fn check<F: Draft>(draft: &Path) -> anyhow::Result<()>
where
    F::Payload: Serialize,
{
    let form = F::build(read_draft(draft)?);
    let payload = form.to_payload().context("draft does not pass validation")?;
    println!("{}", serde_json::to_string_pretty(&payload)?);
    Ok(())
}

fn push<F: Draft>(config: &Config, draft: &Path, images: Vec<(ImageFlag, PathBuf)>) -> anyhow::Result<()>
where
    F::Payload: Serialize,
{
    let form = F::build(read_draft(draft)?);
    let remote = form.remote();
    let mut session = match remote {
        Some(_) => {
            let mut session = BuilderSession::edit();
            session.loaded(form)?;
            session
        }
        None => BuilderSession::create(form),
    };

    let client = ApiClient::new(config);
    let uploader: Arc<dyn Uploader> = Arc::new(F::uploader(client.clone()));
    let (tx, rx) = mpsc::channel();

    for (flag, path) in images {
        let form = session.form_mut()?;
        let target = match flag {
            ImageFlag::Question => ImageTarget::Question,
            ImageFlag::Explanation => ImageTarget::Explanation,
            ImageFlag::Entry(index) => ImageTarget::Entry(
                form.entry_id(index)
                    .with_context(|| format!("the draft has no entry {}", index + 1))?,
            ),
        };
        let file = PendingFile::from_path(&path).with_context(|| format!("failed to read {}", path.display()))?;
        form.upload(Arc::clone(&uploader), target, file, tx.clone())?;
    }
    drop(tx);

    while session.form().is_some_and(|f| f.uploads().is_busy()) {
        let event = rx.recv().context("an upload stopped without reporting back")?;
        if let Some(Settled::Failed { file_name, message, .. }) = session.form_mut()?.apply(event)? {
            warn!(file = %file_name, %message, "image left out");
        }
    }

    let scope = config.scope;
    session
        .save(|payload| F::submit(&client, scope, remote.as_ref(), payload).map(|_| ()))
        .context("failed to save the question")?;

    match remote {
        Some(id) => println!("updated question {BOLD}{}{RESET}", id),
        None => println!("created a new {BOLD}{}{RESET} question", scope),
    }
    Ok(())
}

fn list(config: &Config, kind: QuestionKind, page: usize, search: Option<String>) -> anyhow::Result<()> {
    let client = ApiClient::new(config);
    let mut query = ListQuery::default().page(page);
    if let Some(search) = search {
        query = query.search(search);
    }
    let listing = client
        .list_questions(kind, &query)
        .context("failed to list questions")?;

    for summary in &listing.items {
        println!(
            "{}\t{}\t{}",
            summary.id,
            summary.difficulty_level.as_deref().unwrap_or("-"),
            summary.question
        );
    }
    println!(
        "\npage {BOLD}{}{RESET} of {} ({} questions)",
        listing.meta.page, listing.meta.total_pages, listing.meta.total
    );
    Ok(())
}

fn results(config: &Config, test_id: Option<String>) -> anyhow::Result<()> {
    let client = ApiClient::new(config);
    let query = ResultsQuery {
        test_id,
        ..ResultsQuery::default()
    };
    let listing = client.list_results(&query).context("failed to fetch results")?;

    for result in &listing.items {
        let percentage = result
            .percentage()
            .map_or_else(|| "-".to_string(), |p| format!("{:.1}%", p));
        let flag = if result.flagged() { "  flagged" } else { "" };
        println!(
            "{}\t{}/{}\t{}{}",
            result.student_name, result.score, result.max_score, percentage, flag
        );
    }

    let overview = ResultsOverview::from_results(&listing.items);
    if let Some(average) = overview.average_percentage {
        println!("\naverage {BOLD}{:.1}%{RESET} over {} attempts", average, overview.attempts);
    }
    println!("{} attempts flagged by proctoring", overview.flagged);
    Ok(())
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::INFO.into())
                .from_env_lossy(),
        )
        .init();

    let command = match parse_command(env::args().skip(1)) {
        Ok(command) => command,
        Err(e) => {
            eprintln!("{}", USAGE);
            return Err(e);
        }
    };

    let config = || -> anyhow::Result<Config> {
        let config = Config::from_env().context("failed to read configuration")?;
        info!(api = %config.api_url, scope = %config.scope, "using backend");
        Ok(config)
    };

    match command {
        Command::Check { kind: QuestionKind::Mcq, draft } => check::<McqForm>(&draft),
        Command::Check { draft, .. } => check::<RearrangeForm>(&draft),
        Command::Push { kind: QuestionKind::Mcq, draft, images } => push::<McqForm>(&config()?, &draft, images),
        Command::Push { draft, images, .. } => push::<RearrangeForm>(&config()?, &draft, images),
        Command::List { kind, page, search } => list(&config()?, kind, page, search),
        Command::Results { test_id } => results(&config()?, test_id),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(line: &str) -> impl Iterator<Item = String> + '_ {
        line.split_whitespace().map(String::from)
    }

    #[test]
    fn image_flags() {
        assert_eq!(
            parse_image("option:2=img/graph.png").unwrap(),
            (ImageFlag::Entry(1), PathBuf::from("img/graph.png"))
        );
        assert_eq!(parse_image("question=q.png").unwrap().0, ImageFlag::Question);
        assert!(parse_image("option:0=a.png").is_err());
        assert!(parse_image("footer=a.png").is_err());
        assert!(parse_image("question").is_err());
    }

    #[test]
    fn commands() {
        assert!(matches!(
            parse_command(args("push mcq q.yaml --image item:1=a.png")).unwrap(),
            Command::Push { kind: QuestionKind::Mcq, images, .. } if images.len() == 1
        ));
        assert!(matches!(
            parse_command(args("list coding 3 graphs")).unwrap(),
            Command::List { kind: QuestionKind::Coding, page: 3, search: Some(_) }
        ));
        assert!(parse_command(args("check coding q.json")).is_err());
        assert!(parse_command(args("push mcq q.json extra")).is_err());
    }
}
