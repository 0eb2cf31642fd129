use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use formforge_generate::{FormGenerator, GenerateFormRequest, HttpCompletionGenerator};
use formforge_graph::{
    Answer, CandidateForm, Diagnostic, Form, FormService, MultiSelectPolicy, QuestionId,
    RepairOptions, Severity, SubmittedAnswer, WalkOutcome, next_for_answer, parse_candidate,
    repair_with, validate, walk,
};
use formforge_store::FsDocumentStore;
use std::collections::BTreeMap;
use std::io;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const STORE_DIR_ENV: &str = "FORMFORGE_STORE_DIR";
const DEFAULT_STORE_DIR: &str = ".formforge";

#[derive(Parser, Debug)]
#[command(name = "formforge-cli")]
#[command(about = "Repair, lint, navigate and store branching forms")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Repair a candidate form and print the well-formed result.
    Repair(RepairArgs),
    /// Report diagnostics for a form as written, without repairing it.
    Lint(LintArgs),
    /// Resolve the next question for an answer.
    Next(NextArgs),
    /// Follow a form from its first question using a set of answers.
    Walk(WalkArgs),
    /// Generate a form through the configured completion service.
    Generate(GenerateArgs),
    /// Manage stored forms.
    Forms(FormsArgs),
}

#[derive(clap::Args, Debug)]
struct FormInput {
    #[arg(long)]
    form_file: Option<PathBuf>,
    #[arg(long)]
    form_source: Option<String>,
}

#[derive(clap::Args, Debug)]
struct RepairArgs {
    #[command(flatten)]
    input: FormInput,
    #[arg(long, action = ArgAction::SetTrue)]
    allow_empty_draft: bool,
}

#[derive(clap::Args, Debug)]
struct LintArgs {
    #[command(flatten)]
    input: FormInput,
    #[arg(long, action = ArgAction::SetTrue)]
    json: bool,
}

#[derive(clap::Args, Debug)]
struct NextArgs {
    #[command(flatten)]
    input: FormInput,
    #[arg(long)]
    question: QuestionId,
    /// Repeat for multiple selections.
    #[arg(long = "answer", required = true)]
    answers: Vec<String>,
    #[arg(long, value_enum, default_value_t = MultiSelectMode::DefaultOnly)]
    multi_select: MultiSelectMode,
}

#[derive(clap::Args, Debug)]
struct WalkArgs {
    #[command(flatten)]
    input: FormInput,
    /// JSON object mapping question IDs to an answer or a list of selections.
    #[arg(long)]
    answers: String,
    #[arg(long, value_enum, default_value_t = MultiSelectMode::DefaultOnly)]
    multi_select: MultiSelectMode,
}

#[derive(clap::Args, Debug)]
struct GenerateArgs {
    #[arg(long)]
    topic: String,
    #[arg(long)]
    form_type: String,
    #[arg(long, default_value_t = 5)]
    num_questions: u32,
    #[arg(long = "preference")]
    preferences: Vec<String>,
    #[arg(long, default_value = "local")]
    owner: String,
    /// Store the generated draft instead of only printing it.
    #[arg(long, action = ArgAction::SetTrue)]
    save: bool,
    #[arg(long)]
    store_dir: Option<PathBuf>,
}

#[derive(clap::Args, Debug)]
struct FormsArgs {
    #[arg(long)]
    store_dir: Option<PathBuf>,
    #[command(subcommand)]
    command: FormsCommand,
}

#[derive(Subcommand, Debug)]
enum FormsCommand {
    Create {
        #[arg(long)]
        owner: String,
        #[command(flatten)]
        input: FormInput,
    },
    Show {
        #[arg(long)]
        id: String,
    },
    List {
        #[arg(long)]
        owner: String,
    },
    Update {
        #[arg(long)]
        id: String,
        #[arg(long)]
        owner: String,
        #[command(flatten)]
        input: FormInput,
    },
    Delete {
        #[arg(long)]
        id: String,
        #[arg(long)]
        owner: String,
    },
    Toggle {
        #[arg(long)]
        id: String,
        #[arg(long)]
        owner: String,
    },
    Submit {
        #[arg(long)]
        id: String,
        /// JSON object mapping question IDs to an answer or a list of selections.
        #[arg(long)]
        answers: String,
    },
    Submissions {
        #[arg(long)]
        id: String,
        #[arg(long)]
        owner: String,
    },
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum MultiSelectMode {
    DefaultOnly,
    FirstSelectedMatch,
}

impl From<MultiSelectMode> for MultiSelectPolicy {
    fn from(mode: MultiSelectMode) -> Self {
        match mode {
            MultiSelectMode::DefaultOnly => MultiSelectPolicy::DefaultOnly,
            MultiSelectMode::FirstSelectedMatch => MultiSelectPolicy::FirstSelectedMatch,
        }
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let _ = dotenvy::from_filename(".env.local");
    let _ = dotenvy::from_filename(".env");
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "formforge=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();

    let cli = Cli::parse();
    let result = match cli.command {
        Commands::Repair(args) => repair_command(args),
        Commands::Lint(args) => lint_command(args),
        Commands::Next(args) => next_command(args),
        Commands::Walk(args) => walk_command(args),
        Commands::Generate(args) => generate_command(args).await,
        Commands::Forms(args) => forms_command(args).await,
    };

    match result {
        Ok(code) => code,
        Err(error) => {
            eprintln!("error: {error}");
            ExitCode::from(1)
        }
    }
}

fn repair_command(args: RepairArgs) -> Result<ExitCode, String> {
    let candidate = load_candidate(&args.input)?;
    let options = RepairOptions::new().allow_empty_draft(args.allow_empty_draft);
    let form = repair_with(candidate, &options).map_err(|e| e.to_string())?;
    print_json(&form)?;
    Ok(ExitCode::SUCCESS)
}

fn lint_command(args: LintArgs) -> Result<ExitCode, String> {
    let candidate = load_candidate(&args.input)?;
    let form = Form::try_from(candidate).map_err(|e| e.to_string())?;
    let diagnostics = validate(&form, &[]);

    if args.json {
        print_json(&diagnostics)?;
    } else if diagnostics.is_empty() {
        println!("ok: no diagnostics");
    } else {
        for diagnostic in &diagnostics {
            print_diagnostic(diagnostic);
        }
    }

    if diagnostics.iter().any(Diagnostic::is_error) {
        Ok(ExitCode::from(2))
    } else {
        Ok(ExitCode::SUCCESS)
    }
}

fn next_command(args: NextArgs) -> Result<ExitCode, String> {
    let form = load_repaired_form(&args.input)?;
    let question = form
        .question(args.question)
        .ok_or_else(|| format!("question {} does not exist", args.question))?;
    let answer = match args.answers.as_slice() {
        [single] => Answer::text(single.clone()),
        many => Answer::selections(many.iter().cloned()),
    };

    let target = next_for_answer(question, &answer, args.multi_select.into());
    if target == formforge_graph::END_OF_FORM {
        println!("next: end");
    } else {
        println!("next: {target}");
    }
    Ok(ExitCode::SUCCESS)
}

fn walk_command(args: WalkArgs) -> Result<ExitCode, String> {
    let form = load_repaired_form(&args.input)?;
    let answers = parse_answers(&args.answers)?;

    let result = walk(&form, &answers, args.multi_select.into());
    let visited: Vec<String> = result.visited.iter().map(ToString::to_string).collect();
    println!("visited: {}", visited.join(" -> "));
    match result.outcome {
        WalkOutcome::Completed => println!("outcome: completed"),
        WalkOutcome::AwaitingAnswer(id) => println!("outcome: awaiting answer to {id}"),
        WalkOutcome::Cycle(id) => println!("outcome: cycle at {id}"),
        WalkOutcome::DanglingTarget(id) => println!("outcome: dangling target {id}"),
    }
    Ok(ExitCode::SUCCESS)
}

async fn generate_command(args: GenerateArgs) -> Result<ExitCode, String> {
    let mut request = GenerateFormRequest::new(args.topic, args.form_type, args.num_questions);
    request.preferences = args.preferences;

    let text_generator = HttpCompletionGenerator::from_env().map_err(|e| e.to_string())?;
    let generator = FormGenerator::new(Arc::new(text_generator));
    let generated = if args.save {
        let service = open_service(args.store_dir.as_deref())?;
        generator
            .generate_and_store(&request, &args.owner, &service)
            .await
    } else {
        generator.generate(&request, &args.owner).await
    };
    let form = generated.map_err(|e| e.to_string())?;

    print_json(&form)?;
    Ok(ExitCode::SUCCESS)
}

async fn forms_command(args: FormsArgs) -> Result<ExitCode, String> {
    let service = open_service(args.store_dir.as_deref())?;
    match args.command {
        FormsCommand::Create { owner, input } => {
            let form = service
                .create_form(&owner, load_candidate(&input)?)
                .await
                .map_err(|e| e.to_string())?;
            print_json(&form)?;
        }
        FormsCommand::Show { id } => {
            let form = service.get_form(&id).await.map_err(|e| e.to_string())?;
            print_json(&form)?;
        }
        FormsCommand::List { owner } => {
            let forms = service.list_forms(&owner).await.map_err(|e| e.to_string())?;
            for form in &forms {
                println!(
                    "{}\t{}\t{}\t{} question(s)",
                    form.id.as_deref().unwrap_or("<unsaved>"),
                    form.state(),
                    form.name,
                    form.question_count()
                );
            }
        }
        FormsCommand::Update { id, owner, input } => {
            let form = service
                .update_form(&id, &owner, load_candidate(&input)?)
                .await
                .map_err(|e| e.to_string())?;
            print_json(&form)?;
        }
        FormsCommand::Delete { id, owner } => {
            service
                .delete_form(&id, &owner)
                .await
                .map_err(|e| e.to_string())?;
            println!("deleted: {id}");
        }
        FormsCommand::Toggle { id, owner } => {
            let form = service
                .toggle_draft(&id, &owner)
                .await
                .map_err(|e| e.to_string())?;
            println!("{id}: {}", form.state());
        }
        FormsCommand::Submit { id, answers } => {
            let answers = parse_answers(&answers)?
                .into_iter()
                .map(|(question_id, answer)| SubmittedAnswer::new(question_id, answer))
                .collect();
            let submission = service
                .submit(&id, answers)
                .await
                .map_err(|e| e.to_string())?;
            print_json(&submission)?;
        }
        FormsCommand::Submissions { id, owner } => {
            let submissions = service
                .list_submissions(&id, &owner)
                .await
                .map_err(|e| e.to_string())?;
            print_json(&submissions)?;
        }
    }
    Ok(ExitCode::SUCCESS)
}

fn open_service(
    store_dir: Option<&Path>,
) -> Result<FormService<FsDocumentStore, FsDocumentStore>, String> {
    let root = match store_dir {
        Some(path) => path.to_path_buf(),
        None => std::env::var(STORE_DIR_ENV)
            .ok()
            .filter(|value| !value.trim().is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_STORE_DIR)),
    };
    tracing::debug!(root = %root.display(), "opening form store");
    let store = FsDocumentStore::new(&root).map_err(|e| e.to_string())?;
    Ok(FormService::new(store.clone(), store))
}

fn load_form_source(input: &FormInput) -> Result<String, String> {
    match (input.form_file.as_deref(), input.form_source.as_deref()) {
        (Some(_), Some(_)) => Err("provide only one of --form-file or --form-source".to_string()),
        (None, None) => Err("one of --form-file or --form-source is required".to_string()),
        (Some(path), None) => std::fs::read_to_string(path)
            .map_err(|e| format!("failed reading form file '{}': {e}", path.display())),
        (None, Some(source)) => Ok(source.to_string()),
    }
}

fn load_candidate(input: &FormInput) -> Result<CandidateForm, String> {
    let source = load_form_source(input)?;
    parse_candidate(&source).map_err(|e| e.to_string())
}

fn load_repaired_form(input: &FormInput) -> Result<Form, String> {
    let candidate = load_candidate(input)?;
    repair_with(candidate, &RepairOptions::default()).map_err(|e| e.to_string())
}

fn parse_answers(raw: &str) -> Result<BTreeMap<QuestionId, Answer>, String> {
    serde_json::from_str(raw).map_err(|e| format!("invalid answers JSON: {e}"))
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<(), String> {
    let json = serde_json::to_string_pretty(value).map_err(|e| e.to_string())?;
    println!("{json}");
    Ok(())
}

fn print_diagnostic(diagnostic: &Diagnostic) {
    let severity = match diagnostic.severity {
        Severity::Error => "error",
        Severity::Warning => "warning",
        Severity::Info => "info",
    };
    let location = diagnostic
        .question_id
        .map(|id| format!(" question {id}"))
        .unwrap_or_default();
    println!(
        "{severity}[{}]{location}: {}",
        diagnostic.rule, diagnostic.message
    );
    if let Some(fix) = diagnostic.fix.as_deref() {
        println!("  fix: {fix}");
    }
}
