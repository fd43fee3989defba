use std::path::PathBuf;
use std::process::ExitCode;

use chrono::Utc;
use metrics_exporter_prometheus::PrometheusBuilder;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

use email_triage::{
    app_state::AppState,
    config::AppConfig,
    models::{
        email::{Category, Email},
        job::{JobSnapshot, QueueUpdate},
        submission::EmailSubmission,
        telemetry::{ApiUsage, BackendStatus},
    },
    services::{
        attachment,
        backend::BackendError,
        format,
        history::{self, HistoryQuery, PageItem},
        notice::{ConsoleSink, Notice},
        polling::{self, ProgressObserver},
        progress::ProgressView,
        telemetry::Reading,
    },
};

const USAGE: &str = "\
usage: triage <command> [options]

commands:
  submit   --content TEXT | --file PATH  [--subject S] [--sender S]
           [--subject-from-file] [--sender-from-file]
  list     [--search TEXT] [--category productive|unproductive]... [--page N]
  show     <email-id>
  status
  usage
  watch";

enum Command {
    Submit(SubmitArgs),
    List(HistoryQuery),
    Show(i64),
    Status,
    Usage,
    Watch,
}

#[derive(Default)]
struct SubmitArgs {
    content: Option<String>,
    file: Option<PathBuf>,
    subject: Option<String>,
    sender: Option<String>,
    subject_from_file: bool,
    sender_from_file: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    // Logs go to stderr so command output stays clean
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .json()
        .init();

    let command = match parse_args(std::env::args().skip(1).collect()) {
        Ok(command) => command,
        Err(err) => {
            eprintln!("{err}\n\n{USAGE}");
            return ExitCode::from(2);
        }
    };

    let config = match AppConfig::from_env() {
        Ok(config) => config,
        Err(err) => {
            eprintln!("Invalid configuration: {err}");
            return ExitCode::from(2);
        }
    };

    tracing::debug!(backend = %config.api_backend, disabled = config.system_disabled, "Starting triage client");

    install_metrics(&config);

    let state = match AppState::new(config, ConsoleSink) {
        Ok(state) => state,
        Err(err) => {
            eprintln!("Could not initialize the HTTP client: {err}");
            return ExitCode::FAILURE;
        }
    };

    let outcome = match command {
        Command::Submit(args) => submit(&state, args).await,
        Command::List(query) => list(&state, query).await,
        Command::Show(id) => show(&state, id).await,
        Command::Status => status(&state).await,
        Command::Usage => usage(&state).await,
        Command::Watch => watch(&state).await,
    };

    match outcome {
        Ok(()) => ExitCode::SUCCESS,
        Err(notice) => {
            state.notices.notify(notice);
            ExitCode::FAILURE
        }
    }
}

/// Export metrics over HTTP when `METRICS_ADDR` is set; otherwise the
/// counters stay no-ops.
fn install_metrics(config: &AppConfig) {
    let addr = match config.metrics_listen_addr() {
        Ok(Some(addr)) => addr,
        Ok(None) => return,
        Err(e) => {
            tracing::warn!(error = %e, "Invalid METRICS_ADDR, metrics not exported");
            return;
        }
    };

    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => {
            polling::describe_metrics();
            tracing::info!(%addr, "Prometheus metrics endpoint listening");
        }
        Err(e) => tracing::warn!(error = %e, "Failed to install Prometheus metrics recorder"),
    }
}

fn parse_args(args: Vec<String>) -> Result<Command, String> {
    let mut iter = args.into_iter();
    let name = iter.next().ok_or_else(|| "Missing command".to_string())?;
    let rest: Vec<String> = iter.collect();

    match name.as_str() {
        "submit" => parse_submit(rest).map(Command::Submit),
        "list" => parse_list(rest).map(Command::List),
        "show" => {
            let id = rest.first().ok_or_else(|| "show needs an email id".to_string())?;
            id.parse()
                .map(Command::Show)
                .map_err(|_| format!("Not an email id: {id}"))
        }
        "status" => Ok(Command::Status),
        "usage" => Ok(Command::Usage),
        "watch" => Ok(Command::Watch),
        "-h" | "--help" | "help" => Err("triage: email triage client".to_string()),
        other => Err(format!("Unknown command: {other}")),
    }
}

fn parse_submit(args: Vec<String>) -> Result<SubmitArgs, String> {
    let mut parsed = SubmitArgs::default();
    let mut iter = args.into_iter();
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--content" => parsed.content = Some(value_for(&arg, iter.next())?),
            "--file" => parsed.file = Some(PathBuf::from(value_for(&arg, iter.next())?)),
            "--subject" => parsed.subject = Some(value_for(&arg, iter.next())?),
            "--sender" => parsed.sender = Some(value_for(&arg, iter.next())?),
            "--subject-from-file" => parsed.subject_from_file = true,
            "--sender-from-file" => parsed.sender_from_file = true,
            other => return Err(format!("Unknown submit option: {other}")),
        }
    }
    if parsed.content.is_some() == parsed.file.is_some() {
        return Err("submit needs exactly one of --content or --file".to_string());
    }
    Ok(parsed)
}

fn parse_list(args: Vec<String>) -> Result<HistoryQuery, String> {
    let mut query = HistoryQuery::default();
    let mut page = None;
    let mut iter = args.into_iter();
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--search" => query.set_search(value_for(&arg, iter.next())?),
            "--category" => {
                let value = value_for(&arg, iter.next())?;
                let category: Category = value
                    .parse()
                    .map_err(|_| format!("Unknown category: {value}"))?;
                query.toggle_category(category);
            }
            "--page" => {
                let value = value_for(&arg, iter.next())?;
                page = Some(
                    value
                        .parse()
                        .map_err(|_| format!("Not a page number: {value}"))?,
                );
            }
            other => return Err(format!("Unknown list option: {other}")),
        }
    }
    // Filters reset the page, so the explicit page is applied last
    if let Some(page) = page {
        query.page = page;
    }
    Ok(query)
}

fn value_for(flag: &str, value: Option<String>) -> Result<String, String> {
    value.ok_or_else(|| format!("{flag} needs a value"))
}

fn backend_notice(title: &str, err: &BackendError) -> Notice {
    Notice::error(title).with_description(err.to_string())
}

/// Prints a progress line whenever it changes.
struct ProgressPrinter {
    view: ProgressView,
    last_line: String,
}

impl ProgressPrinter {
    fn new() -> Self {
        let view = ProgressView::sending();
        let last_line = view.render();
        eprintln!("{last_line}");
        Self { view, last_line }
    }

    fn print_if_changed(&mut self) {
        let line = self.view.render();
        if line != self.last_line {
            eprintln!("{line}");
            self.last_line = line;
        }
    }
}

impl ProgressObserver for ProgressPrinter {
    fn on_status_update(&mut self, snapshot: &JobSnapshot) {
        self.view.apply_snapshot(snapshot);
        self.print_if_changed();
    }

    fn on_queue_update(&mut self, update: QueueUpdate) {
        self.view.apply_queue(update);
        self.print_if_changed();
    }
}

async fn submit(state: &AppState, args: SubmitArgs) -> Result<(), Notice> {
    let submission = match (args.content, args.file) {
        (Some(content), _) => EmailSubmission::text(content),
        (None, Some(path)) => {
            let attachment = attachment::load_attachment(&path)
                .await
                .map_err(|e| Notice::error("Arquivo inválido").with_description(e.to_string()))?;
            state.notices.notify(
                Notice::info(format!("Arquivo selecionado: {}", attachment.file_name))
                    .with_description(format!("Tamanho: {:.2} KB", attachment.size() as f64 / 1024.0)),
            );
            // Typed values only win when given and not explicitly deferred to the file
            EmailSubmission::file(attachment)
                .override_subject(args.subject.is_some() && !args.subject_from_file)
                .override_sender(args.sender.is_some() && !args.sender_from_file)
        }
        (None, None) => return Err(Notice::error("Informe --content ou --file")),
    };
    let submission = match args.subject {
        Some(subject) => submission.with_subject(subject),
        None => submission,
    };
    let submission = match args.sender {
        Some(sender) => submission.with_sender(sender),
        None => submission,
    };

    // Ctrl-C stops the poll loop; the job itself keeps running server-side
    let cancel = CancellationToken::new();
    let watcher = {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            tokio::select! {
                _ = cancel.cancelled() => {}
                signal = tokio::signal::ctrl_c() => {
                    if signal.is_ok() {
                        cancel.cancel();
                    }
                }
            }
        })
    };

    let options = state.poll_options().with_cancel(cancel.clone());
    let mut printer = ProgressPrinter::new();
    let outcome =
        polling::submit_and_await_result(&state.backend, &submission, &options, &mut printer).await;

    cancel.cancel();
    let _ = watcher.await;

    let result = outcome.map_err(|e| Notice::from(&e))?;
    state.notices.notify(
        Notice::success("Email classificado com sucesso!")
            .with_description(format::format_category(result.category())),
    );

    match result.detail_id() {
        Some(id) => match state.backend.email_detail(id).await {
            Ok(email) => print_email(&email),
            Err(e) => {
                tracing::warn!(email_id = id, error = %e, "Could not load the classified email");
                println!("Email #{id}: {}", format::format_category(result.category()));
            }
        },
        None => println!(
            "Job {}: {}",
            result.job_id,
            format::format_category(result.category())
        ),
    }
    Ok(())
}

async fn list(state: &AppState, query: HistoryQuery) -> Result<(), Notice> {
    let history = state
        .backend
        .list_emails()
        .await
        .map_err(|e| backend_notice("Erro ao carregar a lista de emails", &e))?;

    let page = history::paginate(&history.emails, &query);
    if page.total == 0 {
        println!(
            "{}",
            if query.has_filters() {
                "Nenhum email encontrado com os filtros atuais."
            } else {
                "Nenhum email classificado ainda."
            }
        );
        return Ok(());
    }

    let now = Utc::now();
    for email in &page.emails {
        let age = email
            .created_at
            .map(|at| format::format_relative(at, now))
            .unwrap_or_default();
        println!(
            "#{:<5} {:<12} {:<60} {:<24} {:>5}  {}",
            email.id,
            format::format_category(&email.category),
            format::truncate_text(&email.subject, 57),
            format::extract_name_from_email(&email.sender),
            format::format_confidence(email.confidence_score),
            age
        );
    }

    let strip: Vec<String> = history::page_items(page.page, page.total_pages)
        .into_iter()
        .map(|item| match item {
            PageItem::Page { number, active: true } => format!("[{number}]"),
            PageItem::Page { number, .. } => number.to_string(),
            PageItem::Ellipsis => "…".to_string(),
        })
        .collect();
    println!();
    println!(
        "Página {} de {} • {} emails total   {}",
        page.page,
        page.total_pages,
        page.total,
        strip.join(" ")
    );
    Ok(())
}

async fn show(state: &AppState, id: i64) -> Result<(), Notice> {
    let email = state
        .backend
        .email_detail(id)
        .await
        .map_err(|e| backend_notice("Email não encontrado", &e))?;
    print_email(&email);
    Ok(())
}

fn print_email(email: &Email) {
    println!("#{} {}", email.id, email.subject);
    println!("De: {}", email.sender);
    if let Some(at) = email.created_at {
        println!("Recebido: {}", format::format_timestamp(at));
    }
    println!(
        "Categoria: {} (confiança {})",
        format::format_category(&email.category),
        format::format_confidence(email.confidence_score)
    );
    if let Some(content) = &email.content {
        println!("\nConteúdo original:\n{content}");
    }
    if let Some(response) = &email.suggested_response {
        println!("\nResposta sugerida:\n{response}");
    }
}

async fn status(state: &AppState) -> Result<(), Notice> {
    if state.config.system_disabled {
        return Err(Notice::warning("Sistema temporariamente indisponível"));
    }
    let status = state
        .backend
        .status()
        .await
        .map_err(|e| backend_notice("Status do backend indisponível", &e))?;
    print_status(&status);
    Ok(())
}

fn print_status(status: &BackendStatus) {
    println!(
        "Backend: {}{}",
        if status.is_online() { "Online" } else { "Offline" },
        status
            .version
            .as_deref()
            .map(|v| format!(" (v{v})"))
            .unwrap_or_default()
    );
    println!(
        "Banco de dados: {}",
        if status.database_connected() { "Conectado" } else { "Desconectado" }
    );
    if let Some(env) = status.server_info.as_ref().and_then(|info| info.environment.as_deref()) {
        println!("Ambiente: {env}");
    }
    if status.debug_mode {
        println!("Modo debug ativo (desenvolvimento)");
    }
}

async fn usage(state: &AppState) -> Result<(), Notice> {
    if state.config.system_disabled {
        return Err(Notice::warning("Fila indisponível - sistema temporariamente desabilitado"));
    }
    let usage = state
        .backend
        .usage()
        .await
        .map_err(|e| backend_notice("Estatísticas de uso indisponíveis", &e))?;
    print_usage(&usage);
    Ok(())
}

fn print_usage(usage: &ApiUsage) {
    let quota = &usage.quota;
    println!(
        "API por minuto: {}/{} ({:.0}%)",
        quota.minute_usage, quota.minute_limit, quota.minute_percent
    );
    println!(
        "API por dia:    {}/{} ({:.0}%)",
        quota.day_usage, quota.day_limit, quota.day_percent
    );

    let queue = &usage.job_queue;
    println!(
        "Fila: {} na fila, {} em processamento, espera {}",
        queue.queue_length,
        queue.processing_count,
        format::format_wait(queue.estimated_wait)
    );
    if let Some(active) = &queue.active_job {
        let started = active
            .created_at
            .as_deref()
            .and_then(format::parse_timestamp)
            .map(|at| at.format("%H:%M:%S").to_string())
            .unwrap_or_else(|| "?".to_string());
        println!("  em processamento: {}... (iniciado {started})", format::short_id(&active.id, 12));
    }
    for job in &queue.queued_jobs {
        println!(
            "  #{} {}... espera {}",
            job.position_in_queue,
            format::short_id(&job.id, 8),
            job.estimated_wait_time
                .map(format::format_wait)
                .unwrap_or_else(|| "?".to_string())
        );
    }
    if queue.is_idle() {
        println!("  Não há jobs em processamento no momento");
    }
    if usage.is_high_usage() {
        println!("Alto uso da API: algumas requisições podem demorar mais.");
    }
    println!("Total de requisições hoje: {}", quota.total_today);
}

async fn watch(state: &AppState) -> Result<(), Notice> {
    let monitor = state.spawn_telemetry();
    if matches!(monitor.status(), Reading::Disabled) {
        return Err(Notice::warning("Sistema temporariamente indisponível"));
    }

    let mut status_rx = monitor.subscribe_status();
    let mut usage_rx = monitor.subscribe_usage();

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            changed = status_rx.changed() => {
                if changed.is_err() {
                    break;
                }
                let reading = status_rx.borrow_and_update().clone();
                match reading {
                    Reading::Ready(status) => print_status(&status),
                    Reading::Unavailable(reason) => println!("Backend: indisponível ({reason})"),
                    Reading::Loading | Reading::Disabled => {}
                }
            }
            changed = usage_rx.changed() => {
                if changed.is_err() {
                    break;
                }
                let reading = usage_rx.borrow_and_update().clone();
                match reading {
                    Reading::Ready(usage) => {
                        println!("--- {}", Utc::now().format("%H:%M:%S"));
                        print_usage(&usage);
                    }
                    Reading::Unavailable(reason) => println!("Uso da API: indisponível ({reason})"),
                    Reading::Loading | Reading::Disabled => {}
                }
            }
        }
    }

    monitor.shutdown().await;
    Ok(())
}
