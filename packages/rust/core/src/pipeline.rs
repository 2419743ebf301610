//! End-to-end publishing pipeline: keyword → references → article → post.

use std::time::{Duration, Instant};

use rand::seq::SliceRandom;
use tracing::{info, instrument, warn};

use postsmith_generator::{GeneratorClient, SeoDefaults};
use postsmith_publisher::{CmsClient, PostDraft, slugify};
use postsmith_search::SearchClient;
use postsmith_shared::{PostsmithError, PublishResult, Result, RunConfig, RunSummary};
use postsmith_storage::UsedRefStore;

use crate::assembler;

/// Fresh reference links requested per article.
const REFERENCES_PER_ARTICLE: usize = 2;

/// Progress callback for reporting pipeline status.
pub trait ProgressReporter: Send + Sync {
    /// Called when entering a new phase.
    fn phase(&self, name: &str);
    /// Called when work on a keyword begins.
    fn keyword_started(&self, keyword: &str, current: usize, total: usize);
    /// Called when a post goes live.
    fn post_published(&self, result: &PublishResult);
    /// Called when the run completes.
    fn done(&self, summary: &RunSummary);
}

/// No-op progress reporter for headless/test usage.
pub struct SilentProgress;

impl ProgressReporter for SilentProgress {
    fn phase(&self, _name: &str) {}
    fn keyword_started(&self, _keyword: &str, _current: usize, _total: usize) {}
    fn post_published(&self, _result: &PublishResult) {}
    fn done(&self, _summary: &RunSummary) {}
}

/// Run one publishing cycle.
///
/// Draws a random subset of the configured keywords, then for each one:
/// find fresh references, generate the article, assemble the post HTML,
/// resolve a free slug, and publish. A failure on one keyword is logged and
/// counted; the run continues with the next keyword.
#[instrument(skip_all, fields(keywords = config.content.keywords.len()))]
pub async fn run(config: &RunConfig, progress: &dyn ProgressReporter) -> Result<RunSummary> {
    let start = Instant::now();

    if config.content.keywords.is_empty() {
        return Err(PostsmithError::validation(
            "content.keywords is empty; nothing to write about",
        ));
    }

    progress.phase("Loading used-reference store");
    let mut store = UsedRefStore::load(&config.used_refs_path)?;

    let search = SearchClient::new(
        &config.search_endpoint,
        &config.search_engine_id,
        &config.search_api_key,
        &config.search_locale,
        config.search_result_count,
    )?;
    let generator = GeneratorClient::new(&config.genai_url, &config.genai_api_key)?;
    let cms = CmsClient::new(
        &config.cms_url,
        &config.cms_username,
        &config.cms_password,
        config.category_id,
    )?;

    let mut keywords = config.content.keywords.clone();
    keywords.shuffle(&mut rand::thread_rng());
    keywords.truncate(config.content.posts_per_run);

    info!(count = keywords.len(), "keywords selected for this run");

    let mut summary = RunSummary::default();
    let total = keywords.len();

    for (i, keyword) in keywords.iter().enumerate() {
        progress.keyword_started(keyword, i + 1, total);

        match publish_one(config, &search, &generator, &cms, &mut store, keyword).await {
            Ok(result) => {
                progress.post_published(&result);
                summary.succeeded += 1;
            }
            Err(e) => {
                warn!(%keyword, error = %e, "keyword failed, continuing with the next one");
                summary.failed += 1;
            }
        }

        // Pause between keywords so the upstream APIs are not hammered.
        if i + 1 < total && config.content.delay_secs > 0 {
            tokio::time::sleep(Duration::from_secs(config.content.delay_secs)).await;
        }
    }

    progress.done(&summary);

    info!(
        succeeded = summary.succeeded,
        failed = summary.failed,
        elapsed_ms = start.elapsed().as_millis(),
        "publishing run complete"
    );

    Ok(summary)
}

/// Generate and publish a single post for `keyword`.
async fn publish_one(
    config: &RunConfig,
    search: &SearchClient,
    generator: &GeneratorClient,
    cms: &CmsClient,
    store: &mut UsedRefStore,
    keyword: &str,
) -> Result<PublishResult> {
    let content = &config.content;

    // --- References ---
    let found = search
        .find_references(keyword, store.urls(), REFERENCES_PER_ARTICLE)
        .await;

    let references = if found.is_empty() {
        let fallback: Vec<String> = content
            .fallback_references
            .iter()
            .take(REFERENCES_PER_ARTICLE)
            .cloned()
            .collect();
        info!(%keyword, "no fresh references found, using fallback list");
        fallback
    } else {
        // Record immediately so a later failure cannot cause reuse.
        store.record(&found)?;
        found
    };

    // --- Generation ---
    let defaults = SeoDefaults {
        keyword,
        brand_suffix: &content.seo_brand_suffix,
        default_keywords: &content.default_seo_keywords,
    };
    let article = generator
        .generate(
            keyword,
            &content.brand,
            &content.site_name,
            &references,
            &content.tags,
            &defaults,
        )
        .await?;

    // --- Assembly ---
    let html = assembler::assemble(
        &article.body_html,
        &article.references,
        &content.brand,
        &content.site_name,
        &article.tags,
    );

    // --- Slug ---
    let mut base_slug = slugify(&article.seo_title);
    if base_slug.is_empty() {
        base_slug = slugify(keyword);
    }
    if base_slug.is_empty() {
        return Err(PostsmithError::validation(format!(
            "could not derive a slug for keyword {keyword:?}"
        )));
    }
    let slug = cms.unique_slug(&base_slug).await;

    // --- Publish ---
    let draft = PostDraft {
        title: article.seo_title,
        content: html,
        slug,
        meta_description: article.meta_description,
        focus_keyword: article.focus_keyword,
    };

    cms.publish(&draft).await
}
