use super::{AudienceStage, ProductAnalysis};

impl ProductAnalysis {
    /// Returns a new tree where the piece at (`stage`, `piece_id`) carries
    /// `image_uri`. The scan is scoped to the given stage, so a duplicate id
    /// in another stage can never be touched. An id with no match in the
    /// stage leaves the tree equal to the input.
    pub fn with_generated_image(
        &self,
        stage: AudienceStage,
        piece_id: &str,
        image_uri: &str,
    ) -> ProductAnalysis {
        let mut next = self.clone();
        if let Some(piece) = next
            .ad_copies
            .stage_mut(stage)
            .iter_mut()
            .find(|piece| piece.id == piece_id)
        {
            piece.generated_image_url = Some(image_uri.to_string());
        }
        next
    }
}
