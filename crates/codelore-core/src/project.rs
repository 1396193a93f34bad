//! Project onboarding: first index pass and first commit sync, run
//! concurrently when a project is created.

use codelore_llm::LlmProvider;
use codelore_store::{Project, ProjectStore};

use crate::indexer::{IndexReport, RepoIndexer};
use crate::sync::CommitSync;

/// Outcome of onboarding a new project. Failure of one leg never cancels
/// the other; failed legs land in `errors`.
#[derive(Debug, Default)]
pub struct OnboardReport {
    pub index: Option<IndexReport>,
    pub new_commits: Option<u64>,
    pub errors: Vec<String>,
}

/// Index the repository and sync its commit log concurrently.
pub async fn onboard_project<P: LlmProvider, S: ProjectStore>(
    indexer: &RepoIndexer<P, S>,
    sync: &CommitSync<P, S>,
    project: &Project,
) -> OnboardReport {
    let mut report = OnboardReport::default();

    let Some(github_url) = project
        .github_url
        .as_deref()
        .filter(|url| !url.is_empty())
    else {
        report
            .errors
            .push(format!("project {} has no GitHub URL", project.id));
        return report;
    };

    let (index, synced) = tokio::join!(
        indexer.index_repository(&project.id, github_url, project.github_token.as_deref()),
        sync.sync_commits(&project.id),
    );

    match index {
        Ok(r) => report.index = Some(r),
        Err(e) => report.errors.push(format!("index: {e}")),
    }
    match synced {
        Ok(n) => report.new_commits = Some(n),
        Err(e) => report.errors.push(format!("sync: {e}")),
    }

    tracing::info!(
        project_id = %project.id,
        indexed = report.index.as_ref().map(|r| r.files_indexed),
        new_commits = report.new_commits,
        errors = report.errors.len(),
        "project onboarding finished"
    );
    report
}
