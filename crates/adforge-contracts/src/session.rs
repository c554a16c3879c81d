//! Session-scoped state for one user's research flow.
//!
//! The container is the single source of truth: one `ProductAnalysis` at a
//! time, replaced wholesale by each search, patched at exactly one (stage,
//! piece id) path per image merge. Enrichment results carry the search token
//! they were spawned under; a result whose token no longer matches the
//! current search is discarded instead of being applied to a stale tree.

use std::collections::BTreeMap;

use uuid::Uuid;

use crate::analysis::{AudienceStage, ProductAnalysis};

/// Identity of one analysis request. Enrichment workers hold a copy and
/// present it when delivering results.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchToken(Uuid);

impl SearchToken {
    fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

/// Key for per-piece bookkeeping. Scoped by stage because piece ids are only
/// unique within their stage.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct PieceKey {
    pub stage: AudienceStage,
    pub piece_id: String,
}

impl PieceKey {
    pub fn new(stage: AudienceStage, piece_id: impl Into<String>) -> Self {
        Self {
            stage,
            piece_id: piece_id.into(),
        }
    }
}

#[derive(Debug, Default)]
pub struct SessionState {
    product_name: Option<String>,
    token: Option<SearchToken>,
    loading: bool,
    analysis: Option<ProductAnalysis>,
    last_error: Option<String>,
    pending_images: BTreeMap<PieceKey, bool>,
}

impl SessionState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts a new search: clears the current tree, invalidates every
    /// pending enrichment, and hands back the token the eventual completion
    /// must present. Whitespace-only input does not start a search.
    pub fn begin_search(&mut self, product_name: &str) -> Option<SearchToken> {
        let trimmed = product_name.trim();
        if trimmed.is_empty() {
            return None;
        }
        let token = SearchToken::new();
        self.product_name = Some(trimmed.to_string());
        self.token = Some(token);
        self.loading = true;
        self.analysis = None;
        self.last_error = None;
        self.pending_images.clear();
        Some(token)
    }

    /// Installs the analysis tree for `token`. Returns false (and drops the
    /// tree) when a newer search has superseded it.
    pub fn complete_search(&mut self, token: SearchToken, analysis: ProductAnalysis) -> bool {
        if self.token != Some(token) {
            return false;
        }
        self.analysis = Some(analysis);
        self.loading = false;
        self.last_error = None;
        true
    }

    /// Records a failed analysis: the in-progress tree is cleared and the
    /// loading state halts so the user can resubmit.
    pub fn fail_search(&mut self, token: SearchToken, message: &str) -> bool {
        if self.token != Some(token) {
            return false;
        }
        self.analysis = None;
        self.loading = false;
        self.last_error = Some(message.to_string());
        true
    }

    pub fn mark_generating(&mut self, token: SearchToken, key: PieceKey) -> bool {
        if self.token != Some(token) {
            return false;
        }
        self.pending_images.insert(key, true);
        true
    }

    pub fn is_generating(&self, key: &PieceKey) -> bool {
        self.pending_images.get(key).copied().unwrap_or(false)
    }

    /// Applies one enrichment result. Stale tokens are discarded without any
    /// side effect; an unknown piece id within the stage leaves the tree
    /// unchanged (the merge itself is a no-op there).
    pub fn apply_image(
        &mut self,
        token: SearchToken,
        stage: AudienceStage,
        piece_id: &str,
        image_uri: &str,
    ) -> bool {
        if self.token != Some(token) {
            return false;
        }
        self.pending_images
            .remove(&PieceKey::new(stage, piece_id));
        let Some(current) = self.analysis.as_ref() else {
            return false;
        };
        self.analysis = Some(current.with_generated_image(stage, piece_id, image_uri));
        true
    }

    /// Clears the generating flag after a failed enrichment. Root state is
    /// never touched; the piece simply stays imageless and retryable.
    pub fn enrichment_failed(&mut self, token: SearchToken, stage: AudienceStage, piece_id: &str) {
        if self.token != Some(token) {
            return;
        }
        self.pending_images
            .remove(&PieceKey::new(stage, piece_id));
    }

    pub fn analysis(&self) -> Option<&ProductAnalysis> {
        self.analysis.as_ref()
    }

    pub fn product_name(&self) -> Option<&str> {
        self.product_name.as_deref()
    }

    pub fn current_token(&self) -> Option<SearchToken> {
        self.token
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn pending_count(&self) -> usize {
        self.pending_images.len()
    }
}

#[cfg(test)]
mod tests {
    use super::{PieceKey, SessionState};
    use crate::analysis::AudienceStage;
    use crate::testutil::sample_analysis;

    #[test]
    fn whitespace_product_name_does_not_start_a_search() {
        let mut session = SessionState::new();
        assert!(session.begin_search("   ").is_none());
        assert!(!session.is_loading());
        assert_eq!(session.product_name(), None);
    }

    #[test]
    fn search_lifecycle_replaces_state_wholesale() {
        let mut session = SessionState::new();
        let token = session.begin_search("Organic Honey").unwrap();
        assert!(session.is_loading());

        assert!(session.complete_search(token, sample_analysis()));
        assert!(!session.is_loading());
        assert!(session.analysis().is_some());

        let second = session.begin_search("Clay Cookware").unwrap();
        assert!(session.analysis().is_none(), "new search clears the tree");
        assert!(session.complete_search(second, sample_analysis()));
        assert_eq!(session.product_name(), Some("Clay Cookware"));
    }

    #[test]
    fn stale_completion_is_dropped() {
        let mut session = SessionState::new();
        let old = session.begin_search("Organic Honey").unwrap();
        let _new = session.begin_search("Clay Cookware").unwrap();

        assert!(!session.complete_search(old, sample_analysis()));
        assert!(session.analysis().is_none());
        assert!(session.is_loading(), "the live search is still in flight");
    }

    #[test]
    fn failed_search_clears_tree_and_halts_loading() {
        let mut session = SessionState::new();
        let token = session.begin_search("Organic Honey").unwrap();
        assert!(session.fail_search(token, "analysis failed"));
        assert!(!session.is_loading());
        assert!(session.analysis().is_none());
        assert_eq!(session.last_error(), Some("analysis failed"));
    }

    #[test]
    fn apply_image_patches_current_tree_and_clears_flag() {
        let mut session = SessionState::new();
        let token = session.begin_search("Organic Honey").unwrap();
        session.complete_search(token, sample_analysis());

        let key = PieceKey::new(AudienceStage::Cold, "cold-1");
        session.mark_generating(token, key.clone());
        assert!(session.is_generating(&key));

        assert!(session.apply_image(token, AudienceStage::Cold, "cold-1", "data:uri"));
        assert!(!session.is_generating(&key));
        let piece = &session.analysis().unwrap().ad_copies.cold_audience[0];
        assert_eq!(piece.generated_image_url.as_deref(), Some("data:uri"));
    }

    #[test]
    fn stale_enrichment_is_discarded() {
        let mut session = SessionState::new();
        let old = session.begin_search("Organic Honey").unwrap();
        session.complete_search(old, sample_analysis());
        session.mark_generating(old, PieceKey::new(AudienceStage::Cold, "cold-1"));

        let fresh = session.begin_search("Clay Cookware").unwrap();
        session.complete_search(fresh, sample_analysis());

        assert!(!session.apply_image(old, AudienceStage::Cold, "cold-1", "data:stale"));
        let piece = &session.analysis().unwrap().ad_copies.cold_audience[0];
        assert_eq!(piece.generated_image_url, None);
    }

    #[test]
    fn enrichment_failure_only_clears_the_flag() {
        let mut session = SessionState::new();
        let token = session.begin_search("Organic Honey").unwrap();
        session.complete_search(token, sample_analysis());

        let key = PieceKey::new(AudienceStage::Warm, "warm-1");
        session.mark_generating(token, key.clone());
        session.enrichment_failed(token, AudienceStage::Warm, "warm-1");

        assert!(!session.is_generating(&key));
        let before = sample_analysis();
        assert_eq!(session.analysis(), Some(&before));
    }

    #[test]
    fn out_of_order_enrichments_converge_to_the_same_tree() {
        let sample = sample_analysis();

        let mut first = SessionState::new();
        let t1 = first.begin_search("Organic Honey").unwrap();
        first.complete_search(t1, sample.clone());
        first.apply_image(t1, AudienceStage::Cold, "cold-1", "data:a");
        first.apply_image(t1, AudienceStage::Hot, "hot-1", "data:b");

        let mut second = SessionState::new();
        let t2 = second.begin_search("Organic Honey").unwrap();
        second.complete_search(t2, sample);
        second.apply_image(t2, AudienceStage::Hot, "hot-1", "data:b");
        second.apply_image(t2, AudienceStage::Cold, "cold-1", "data:a");

        assert_eq!(first.analysis(), second.analysis());
    }
}
