use std::path::{Path, PathBuf};
use std::sync::Mutex;

use actix_cors::Cors;
use actix_web::{get, post, put, web, App, HttpResponse, HttpServer, Responder};
use clap::Parser;
use log::{info, warn};

use serde::Deserialize;
use rs_chain_core::io::{list_files, normalize_folder, CORPUS_EXTENSION};
use rs_chain_core::{GraphError, LoadReport, Session};

/// Command-line configuration of the server.
#[derive(Parser, Debug)]
#[command(name = "rs-chain-server", version, about = "HTTP front-end of the word chain generator")]
struct Args {
	/// Address to bind
	#[arg(long, default_value = "127.0.0.1")]
	host: String,
	/// Port to bind
	#[arg(long, default_value_t = 5000)]
	port: u16,
	/// Folder holding the `.txt` corpora
	#[arg(long, default_value = "./data")]
	data: String,
	/// Comma-separated corpus names loaded at startup
	#[arg(long)]
	load: Option<String>,
}

/// Struct representing query parameters for the `/v1/generate` endpoint
#[derive(Deserialize)]
struct GenerateParams {
	nb_try: Option<usize>,
}

#[derive(Deserialize)]
struct CorpusQuery {
	names: Option<String>,
}

struct SharedData {
	session: Session,
	data_dir: PathBuf,
}

/// Failure of a corpus load request.
#[derive(Debug, PartialEq)]
enum LoadError {
	/// Name that would escape the data folder.
	InvalidName(String),
	/// Corpus file missing or unreadable.
	Io(String),
}

impl LoadError {
	fn into_response(self) -> HttpResponse {
		match self {
			LoadError::InvalidName(name) => HttpResponse::BadRequest().body(format!("Invalid corpus name: {name}")),
			LoadError::Io(e) => HttpResponse::InternalServerError().body(e),
		}
	}
}

/// Loads the given corpora from the data folder into a fresh session.
///
/// Nothing shared is touched, so a failure leaves the running session as it was.
fn load_session<S: AsRef<str>>(data_dir: &Path, names: &[S]) -> Result<(Session, LoadReport), LoadError> {
	if let Some(name) = names.iter().map(|n| n.as_ref()).find(|n| n.contains(['/', '\\']) || n.contains("..")) {
		return Err(LoadError::InvalidName(name.to_owned()));
	}

	let mut session = Session::new();
	let mut total = LoadReport::default();
	for name in names.iter().map(|n| n.as_ref()) {
		let path = data_dir.join(format!("{name}.{CORPUS_EXTENSION}"));
		let report = session
			.load_corpus(&path)
			.map_err(|e| LoadError::Io(format!("Failed to load corpus {name}: {e}")))?;
		total.ingested += report.ingested;
		total.skipped += report.skipped;
	}
	Ok((session, total))
}

/// Splits a comma-separated list, dropping blanks.
fn split_names(names: &str) -> Vec<&str> {
	names.split(',').map(|s| s.trim()).filter(|s| !s.is_empty()).collect()
}

/// Maps a graph error to an HTTP response.
fn error_response(e: &GraphError) -> HttpResponse {
	match e {
		GraphError::EmptyMessage(_) => HttpResponse::BadRequest().body(e.to_string()),
		GraphError::NoNeighbours { .. } => HttpResponse::Conflict().body(e.to_string()),
		GraphError::RandomWalkFailure { .. } => HttpResponse::InternalServerError().body(e.to_string()),
	}
}

/// HTTP GET endpoint `/v1/generate`
///
/// Walks the graph and returns the generated message as the response body.
/// `nb_try` bounds the retries spent avoiding training messages.
#[get("/v1/generate")]
async fn get_generated(data: web::Data<Mutex<SharedData>>, query: web::Query<GenerateParams>) -> impl Responder {
	let nb_try = query.nb_try.unwrap_or(5);

	let shared_data = match data.lock() {
		Ok(m) => m,
		Err(_) => return HttpResponse::InternalServerError().body("Graph lock failed"),
	};

	match shared_data.session.generate(nb_try) {
		Ok(result) => HttpResponse::Ok().body(result),
		Err(e) => {
			warn!("generation failed: {e}");
			error_response(&e)
		}
	}
}

/// HTTP POST endpoint `/v1/messages`
///
/// Ingests the body, one message per line. Blank lines are skipped.
#[post("/v1/messages")]
async fn post_messages(data: web::Data<Mutex<SharedData>>, body: String) -> impl Responder {
	let mut shared_data = match data.lock() {
		Ok(m) => m,
		Err(_) => return HttpResponse::InternalServerError().body("Graph lock failed"),
	};

	let mut report = LoadReport::default();
	for line in body.lines() {
		match shared_data.session.add_message(line) {
			Ok(()) => report.ingested += 1,
			Err(GraphError::EmptyMessage(_)) => report.skipped += 1,
			Err(e) => return error_response(&e),
		}
	}

	if report.ingested == 0 {
		return error_response(&GraphError::EmptyMessage(body));
	}
	HttpResponse::Ok().json(report)
}

#[get("/v1/corpora")]
async fn get_corpora(data: web::Data<Mutex<SharedData>>) -> impl Responder {
	let data_dir = match data.lock() {
		Ok(m) => m.data_dir.clone(),
		Err(_) => return HttpResponse::InternalServerError().body("Graph lock failed"),
	};
	match list_files(&data_dir, CORPUS_EXTENSION) {
		Ok(files) => {
			let suffix = format!(".{CORPUS_EXTENSION}");
			let names: Vec<&str> = files.iter().map(|f| f.trim_end_matches(&suffix)).collect();
			HttpResponse::Ok().body(names.join("\n"))
		}
		Err(_) => HttpResponse::InternalServerError().body("Failed to list corpora"),
	}
}

#[get("/v1/loaded_corpora")]
async fn get_loaded_corpora(data: web::Data<Mutex<SharedData>>) -> impl Responder {
	let shared_data = match data.lock() {
		Ok(m) => m,
		Err(_) => return HttpResponse::InternalServerError().body("Graph lock failed"),
	};
	HttpResponse::Ok().body(shared_data.session.corpus_names().join("\n"))
}

/// HTTP PUT endpoint `/v1/load_corpora`
///
/// Replaces the session with one built from the listed corpora. Files are
/// read on the blocking pool and the lock is only taken to swap sessions.
#[put("/v1/load_corpora")]
async fn put_corpora(data: web::Data<Mutex<SharedData>>, query: web::Query<CorpusQuery>) -> impl Responder {
	let names: Vec<String> = match &query.names {
		Some(s) if !split_names(s).is_empty() => split_names(s).into_iter().map(str::to_owned).collect(),
		_ => return HttpResponse::BadRequest().body("Missing or empty corpus name"),
	};

	let data_dir = match data.lock() {
		Ok(m) => m.data_dir.clone(),
		Err(_) => return HttpResponse::InternalServerError().body("Graph lock failed"),
	};

	let (session, report) = match web::block(move || load_session(&data_dir, names.as_slice())).await {
		Ok(Ok(loaded)) => loaded,
		Ok(Err(e)) => {
			warn!("{e:?}");
			return e.into_response();
		}
		Err(_) => return HttpResponse::InternalServerError().body("Corpus loading was cancelled"),
	};

	match data.lock() {
		Ok(mut m) => {
			m.session = session;
			HttpResponse::Ok().json(report)
		}
		Err(_) => HttpResponse::InternalServerError().body("Graph lock failed"),
	}
}

#[get("/v1/stats")]
async fn get_stats(data: web::Data<Mutex<SharedData>>) -> impl Responder {
	match data.lock() {
		Ok(m) => HttpResponse::Ok().json(m.session.stats()),
		Err(_) => HttpResponse::InternalServerError().body("Graph lock failed"),
	}
}

/// Registers every endpoint.
fn configure(cfg: &mut web::ServiceConfig) {
	cfg.service(get_generated)
		.service(post_messages)
		.service(get_corpora)
		.service(get_loaded_corpora)
		.service(put_corpora)
		.service(get_stats);
}

/// Main entry point for the server.
///
/// Builds an empty session (optionally loading corpora from `--data`),
/// wraps it in a `Mutex` so ingestion and generation never overlap,
/// and starts an Actix-web HTTP server.
#[actix_web::main]
async fn main() -> std::io::Result<()> {
	env_logger::init();
	let args = Args::parse();

	let data_dir = normalize_folder(&args.data);
	let session = match &args.load {
		Some(load) => match load_session(&data_dir, split_names(load).as_slice()) {
			Ok((session, _)) => session,
			Err(e) => return Err(std::io::Error::new(std::io::ErrorKind::InvalidInput, format!("{e:?}"))),
		},
		None => Session::new(),
	};
	let shared_data = SharedData { session, data_dir };
	let shared_data = web::Data::new(Mutex::new(shared_data));

	info!("listening on {}:{}", args.host, args.port);
	HttpServer::new(move || {
		App::new()
			.wrap(Cors::permissive())
			.app_data(shared_data.clone())
			.configure(configure)
	})
		.bind((args.host.as_str(), args.port))?
		.run()
		.await
}
