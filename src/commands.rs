//! CLI entry points.
//!
//! Each `run_*` function calls one [`Service`] operation and prints a
//! human-readable rendering to stdout. The HTTP server returns the same
//! structures as JSON.

use anyhow::Result;

use crate::config::Config;
use crate::service::Service;

pub async fn run_ingest(service: &Service, url: &str) -> Result<()> {
    let report = service.ingest(url).await?;
    let repo = &report.repository;

    println!("Repository {}/{} ({})", repo.owner, repo.name, repo.id);
    if !report.remote.description.is_empty() {
        println!("  {}", report.remote.description);
    }
    if !report.remote.language.is_empty() {
        println!(
            "  language: {}  stars: {}  forks: {}",
            report.remote.language, report.remote.stars, report.remote.forks
        );
    }
    println!();

    for file in &report.files {
        println!("  {}  {} ({} bytes)", file.id, file.path, file.size_bytes);
    }
    println!();
    println!("Stored {} files.", report.total_files);

    if !report.skipped.is_empty() {
        println!("Skipped {} files:", report.skipped.len());
        for skipped in &report.skipped {
            println!("  {} ({:?})", skipped.path, skipped.reason);
        }
    }
    Ok(())
}

pub async fn run_preview(service: &Service, file_id: &str, lines: Option<usize>) -> Result<()> {
    let preview = service.preview(file_id, lines).await?;
    println!(
        "--- {} ({} lines, {} bytes{}) ---",
        preview.file_path,
        preview.total_lines,
        preview.size_bytes,
        if preview.analyzed { ", analyzed" } else { "" }
    );
    println!("{}", preview.preview);
    Ok(())
}

pub async fn run_analyze(service: &Service, file_id: &str) -> Result<()> {
    let analysis = service.analyze_file(file_id).await?;
    println!("--- {} ---", analysis.file_path);
    println!(
        "model:       {}",
        analysis.model.as_deref().unwrap_or("(heuristic fallback)")
    );
    println!("analyzed_at: {}", analysis.analyzed_at);
    println!();
    println!("{}", analysis.analysis);
    Ok(())
}

pub async fn run_search(service: &Service, repository_id: &str, query: &str) -> Result<()> {
    let result = service.search_code(repository_id, query).await?;
    println!(
        "Searched {} files for \"{}\" ({})",
        result.files_searched,
        result.search_query,
        result.model.as_deref().unwrap_or("heuristic")
    );
    println!();
    println!("{}", result.results);
    Ok(())
}

pub async fn run_related(service: &Service, file_id: &str) -> Result<()> {
    let related = service.related_files(file_id).await?;
    if related.related.is_empty() {
        println!("No related files for {}.", related.file_path);
        return Ok(());
    }

    println!("Related to {}:", related.file_path);
    for (i, r) in related.related.iter().enumerate() {
        println!("{}. [{}] {}", i + 1, r.relationship_score, r.file_path);
    }
    Ok(())
}

pub async fn run_list_repositories(service: &Service) -> Result<()> {
    let repos = service.list_repositories().await?;
    if repos.is_empty() {
        println!("No repositories.");
        return Ok(());
    }

    for repo in repos {
        println!("{}  {}/{}", repo.id, repo.owner, repo.name);
        println!("    url: {}", repo.url);
        println!("    files: {}", repo.file_count);
        println!("    added: {}", repo.created_at);
        println!();
    }
    Ok(())
}

pub async fn run_forget(service: &Service, repository_id: &str) -> Result<()> {
    service.delete_repository(repository_id).await?;
    println!("Deleted repository {}.", repository_id);
    Ok(())
}

pub async fn run_status(service: &Service, config: &Config) -> Result<()> {
    println!("database:     {}", config.db.path.display());
    println!("github api:   {}", config.github.api_url);
    println!(
        "github token: {}",
        if config.github.token.is_some() {
            "set"
        } else {
            "not set"
        }
    );
    println!("model server: {}", config.models.url);

    let status = service.llm_status().await;
    println!(
        "available:    {}",
        if status.available { "yes" } else { "no" }
    );
    println!();

    println!("Recommended models:");
    for model in &status.recommended_models {
        let mark = if status.available_models.contains(model) {
            "loaded"
        } else {
            "missing"
        };
        println!("  {:<24} {}", model, mark);
    }
    Ok(())
}
