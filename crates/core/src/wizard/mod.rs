//! Step-by-step studio controller.
//!
//! The wizard walks the user from the presenter photo to a reviewed batch of
//! three thumbnails. It is front-end agnostic: the terminal UI drives it, and
//! so do the tests with a fake [`ImageSource`].
//!
//! # Architecture
//!
//! - [`state`]: steps, draft and credential gate
//! - [`slots`]: the result arena of the review step
//!
//! Nothing is reachable until the credential gate is open. After that the
//! steps advance one at a time; generation is the only way out of the theme
//! step and the only way into review.

mod slots;
mod state;

pub use slots::Slots;
pub use state::{
    CredentialState, Draft, GenerationProgress, Review, Step, DEFAULT_OVERLAY_TEXT, STEP_COUNT,
};

use crate::credential::CredentialProvider;
use crate::error::{AppError, Result};
use crate::gemini::ImageSource;
use crate::image_processing::ImageData;
use crate::model::{
    normalize_overlay_text, AccentColor, Emotion, Framing, SlotId, SlotUpdate, ThumbnailRequest,
    ThumbnailResult, BATCH_SIZE,
};
use crate::ops::{bounded, CancelToken};
use std::time::Duration;
use tracing::{info, instrument, warn};

/// Everything needed to refine one slot outside the wizard borrow.
#[derive(Debug, Clone)]
pub struct RefineTicket {
    pub slot_id: SlotId,
    pub image: ImageData,
    pub suggestion: String,
    pub accent: AccentColor,
}

pub struct Wizard<S> {
    source: S,
    credential: CredentialState,
    draft: Draft,
    step: Step,
    request_timeout: Duration,
}

impl<S: ImageSource> Wizard<S> {
    pub fn new(source: S, request_timeout: Duration) -> Self {
        Self {
            source,
            credential: CredentialState::Unchecked,
            draft: Draft::default(),
            step: Step::Intro,
            request_timeout,
        }
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn credential_state(&self) -> CredentialState {
        self.credential
    }

    /// Asks the host whether a key is available. A failing host counts as "no".
    pub async fn check_credential(&mut self, provider: &impl CredentialProvider) -> CredentialState {
        self.credential = match provider.has_credential().await {
            Ok(true) => CredentialState::Granted,
            Ok(false) => CredentialState::Missing,
            Err(e) => {
                warn!(error = %e, "credential check failed");
                CredentialState::Missing
            }
        };
        self.credential
    }

    /// Lets the host pick a key; success opens the gate.
    pub async fn select_credential(&mut self, provider: &impl CredentialProvider) -> Result<()> {
        provider.select_credential().await?;
        self.credential = CredentialState::Granted;
        Ok(())
    }

    fn ensure_ready(&self) -> Result<()> {
        match self.credential {
            CredentialState::Granted => Ok(()),
            _ => Err(AppError::CredentialRequired),
        }
    }

    pub fn step(&self) -> &Step {
        &self.step
    }

    pub fn draft(&self) -> &Draft {
        &self.draft
    }

    pub fn set_presenter(&mut self, image: ImageData) -> Result<()> {
        self.ensure_ready()?;
        if image.is_empty() {
            return Err(AppError::IncompleteDraft("presenter photo is empty"));
        }
        self.draft.presenter = Some(image);
        Ok(())
    }

    pub fn set_framing(&mut self, framing: Framing) -> Result<()> {
        self.ensure_ready()?;
        self.draft.framing = framing;
        Ok(())
    }

    pub fn set_emotion(&mut self, emotion: Emotion) -> Result<()> {
        self.ensure_ready()?;
        self.draft.emotion = emotion;
        Ok(())
    }

    pub fn set_overlay_text(&mut self, text: &str) -> Result<()> {
        self.ensure_ready()?;
        self.draft.overlay_text = normalize_overlay_text(text);
        Ok(())
    }

    pub fn set_accent_color(&mut self, color: AccentColor) -> Result<()> {
        self.ensure_ready()?;
        self.draft.accent_color = color;
        Ok(())
    }

    pub fn set_theme(&mut self, theme: &str) -> Result<()> {
        self.ensure_ready()?;
        self.draft.theme = theme.to_string();
        Ok(())
    }

    pub fn next(&mut self) -> Result<()> {
        self.ensure_ready()?;
        let next = match &self.step {
            Step::Intro => Step::Photo,
            Step::Photo if self.draft.presenter.is_none() => {
                return Err(AppError::IncompleteDraft("a presenter photo is required"));
            }
            Step::Photo => Step::Emotion,
            Step::Emotion => Step::Title,
            Step::Title if !self.draft.has_title() => {
                return Err(AppError::IncompleteDraft("the title text is empty"));
            }
            Step::Title => Step::Theme,
            Step::Theme => {
                return Err(AppError::InvalidTransition {
                    action: "advance without generating",
                    step: 4,
                });
            }
            Step::Review(_) => {
                return Err(AppError::InvalidTransition {
                    action: "advance",
                    step: 5,
                });
            }
        };
        self.step = next;
        Ok(())
    }

    /// Goes back one step. Leaving review drops the generated batch.
    pub fn prev(&mut self) -> Result<()> {
        self.ensure_ready()?;
        let prev = match &self.step {
            Step::Intro => {
                return Err(AppError::InvalidTransition {
                    action: "go back",
                    step: 0,
                });
            }
            Step::Photo => Step::Intro,
            Step::Emotion => Step::Photo,
            Step::Title => Step::Emotion,
            Step::Theme => Step::Title,
            Step::Review(_) => Step::Theme,
        };
        self.step = prev;
        Ok(())
    }

    /// Back to the intro with a fresh draft. The credential gate stays as is.
    pub fn reset(&mut self) {
        self.step = Step::Intro;
        self.draft = Draft::default();
        info!("wizard reset");
    }

    fn build_request(&self) -> Result<ThumbnailRequest> {
        let presenter = self
            .draft
            .presenter
            .clone()
            .ok_or(AppError::IncompleteDraft("a presenter photo is required"))?;
        if !self.draft.has_title() {
            return Err(AppError::IncompleteDraft("the title text is empty"));
        }
        if !self.draft.has_theme() {
            return Err(AppError::IncompleteDraft("the scene theme is empty"));
        }

        Ok(ThumbnailRequest {
            presenter,
            emotion: self.draft.emotion,
            overlay_text: self.draft.overlay_text.clone(),
            theme: self.draft.theme.trim().to_string(),
            accent_color: self.draft.accent_color,
            framing: self.draft.framing,
        })
    }

    /// Generates the batch, one variation after the other.
    ///
    /// Moves to review only when every variation succeeded; otherwise the
    /// wizard stays on the theme step and the error is returned.
    #[instrument(skip_all)]
    pub async fn generate(
        &mut self,
        cancel: &CancelToken,
        mut on_progress: impl FnMut(GenerationProgress),
    ) -> Result<()> {
        self.ensure_ready()?;
        if !matches!(self.step, Step::Theme) {
            return Err(AppError::InvalidTransition {
                action: "generate",
                step: self.step.index(),
            });
        }
        let request = self.build_request()?;

        let seed = SlotId::batch_seed();
        let mut results = Vec::with_capacity(BATCH_SIZE);
        on_progress(GenerationProgress {
            completed: 0,
            total: BATCH_SIZE,
        });

        for variation in 0..BATCH_SIZE {
            let outcome = bounded(
                "generate",
                self.request_timeout,
                cancel,
                self.source.generate(&request, variation),
            )
            .await;

            let image = match outcome {
                Ok(image) => image,
                Err(e) => {
                    warn!(variation, error = %e, "generation failed");
                    if matches!(e, AppError::InvalidCredential(_)) {
                        self.credential = CredentialState::Missing;
                    }
                    return Err(e);
                }
            };

            results.push(ThumbnailResult::new(
                SlotId::derive(seed, variation),
                image,
                &request.overlay_text,
                request.framing,
            ));
            on_progress(GenerationProgress {
                completed: variation + 1,
                total: BATCH_SIZE,
            });
        }

        info!(count = results.len(), "batch ready");
        self.step = Step::Review(Review {
            request,
            slots: Slots::new(results),
        });
        Ok(())
    }

    pub fn review(&self) -> Result<&Review> {
        match &self.step {
            Step::Review(review) => Ok(review),
            other => Err(AppError::InvalidTransition {
                action: "review results",
                step: other.index(),
            }),
        }
    }

    fn review_mut(&mut self) -> Result<&mut Review> {
        match &mut self.step {
            Step::Review(review) => Ok(review),
            other => Err(AppError::InvalidTransition {
                action: "edit results",
                step: other.index(),
            }),
        }
    }

    pub fn results(&self) -> Result<&[ThumbnailResult]> {
        Ok(self.review()?.slots.as_slice())
    }

    pub fn update_slot(&mut self, index: usize, update: &SlotUpdate) -> Result<()> {
        self.ensure_ready()?;
        self.review_mut()?.slots.get_mut(index)?.apply(update);
        Ok(())
    }

    /// Marks the slot as refining and hands out what the remote call needs.
    pub fn begin_refine(&mut self, index: usize) -> Result<RefineTicket> {
        self.ensure_ready()?;
        let review = self.review_mut()?;
        let accent = review.request.accent_color;
        let slot = review.slots.get_mut(index)?;
        if slot.refining {
            return Err(AppError::InvalidTransition {
                action: "refine a slot that is already refining",
                step: 5,
            });
        }
        slot.refining = true;
        Ok(RefineTicket {
            slot_id: slot.id.clone(),
            image: slot.image.clone(),
            suggestion: slot.suggestion.clone(),
            accent,
        })
    }

    /// Runs the remote refinement for a ticket. Only borrows the wizard
    /// immutably, so several tickets can be in flight at once.
    pub async fn run_refine(&self, ticket: &RefineTicket, cancel: &CancelToken) -> Result<ImageData> {
        self.ensure_ready()?;
        bounded(
            "refine",
            self.request_timeout,
            cancel,
            self.source
                .refine(&ticket.image, &ticket.suggestion, ticket.accent),
        )
        .await
    }

    /// Applies a refinement outcome to the slot the ticket came from.
    ///
    /// Success swaps the image and clears the suggestion. Failure leaves
    /// image and suggestion untouched. Either way the slot stops refining.
    pub fn finish_refine(&mut self, ticket: RefineTicket, outcome: Result<ImageData>) -> Result<()> {
        if matches!(outcome, Err(AppError::InvalidCredential(_))) {
            self.credential = CredentialState::Missing;
        }
        let review = match &mut self.step {
            Step::Review(review) => review,
            _ => return Err(AppError::StaleSlot(ticket.slot_id.to_string())),
        };
        let slot = review.slots.by_id_mut(&ticket.slot_id)?;
        slot.refining = false;

        match outcome {
            Ok(image) => {
                slot.image = image;
                slot.suggestion.clear();
                info!(slot = %ticket.slot_id, "slot refined");
                Ok(())
            }
            Err(e) => {
                warn!(slot = %ticket.slot_id, error = %e, "refinement failed");
                Err(e)
            }
        }
    }

    /// Refines one slot in place; other slots are never touched.
    pub async fn refine_slot(&mut self, index: usize, cancel: &CancelToken) -> Result<()> {
        let ticket = self.begin_refine(index)?;
        let outcome = self.run_refine(&ticket, cancel).await;
        self.finish_refine(ticket, outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image_processing::ImageProcessor;
    use image::{Rgba, RgbaImage};
    use std::cell::{Cell, RefCell};

    #[derive(Clone, Copy)]
    enum Failure {
        Quota,
        Credential,
        Network,
        Hang,
    }

    impl Failure {
        async fn raise(self) -> AppError {
            match self {
                Failure::Quota => AppError::QuotaExceeded("RESOURCE_EXHAUSTED".into()),
                Failure::Credential => AppError::InvalidCredential("API_KEY_INVALID".into()),
                Failure::Network => AppError::gemini("connection reset"),
                Failure::Hang => std::future::pending().await,
            }
        }
    }

    #[derive(Default)]
    struct FakeSource {
        generate_failure: Option<(usize, Failure)>,
        refine_failure: Option<Failure>,
        generated: Cell<usize>,
        refine_suggestions: RefCell<Vec<String>>,
    }

    fn png(shade: u8) -> ImageData {
        let img = RgbaImage::from_pixel(16, 9, Rgba([shade, shade, shade, 255]));
        ImageData::png(ImageProcessor::encode_png(&img).unwrap())
    }

    impl ImageSource for FakeSource {
        async fn generate(&self, _request: &ThumbnailRequest, variation: usize) -> Result<ImageData> {
            if let Some((at, failure)) = self.generate_failure {
                if at == variation {
                    return Err(failure.raise().await);
                }
            }
            self.generated.set(self.generated.get() + 1);
            Ok(png(variation as u8 * 10))
        }

        async fn refine(
            &self,
            _image: &ImageData,
            suggestion: &str,
            _accent: AccentColor,
        ) -> Result<ImageData> {
            self.refine_suggestions.borrow_mut().push(suggestion.to_string());
            if let Some(failure) = self.refine_failure {
                return Err(failure.raise().await);
            }
            Ok(png(200))
        }
    }

    struct FakeHost {
        has_key: bool,
        can_select: bool,
    }

    impl CredentialProvider for FakeHost {
        async fn has_credential(&self) -> Result<bool> {
            Ok(self.has_key)
        }

        async fn select_credential(&self) -> Result<()> {
            if self.can_select {
                Ok(())
            } else {
                Err(AppError::MissingEnvVar("GEMINI_API_KEY".into()))
            }
        }
    }

    const GRANTED: FakeHost = FakeHost {
        has_key: true,
        can_select: true,
    };

    async fn wizard_at_theme(source: FakeSource) -> Wizard<FakeSource> {
        let mut w = Wizard::new(source, Duration::from_secs(5));
        w.check_credential(&GRANTED).await;
        w.next().unwrap();
        w.set_presenter(png(1)).unwrap();
        w.set_framing(Framing::Medium).unwrap();
        w.next().unwrap();
        w.set_emotion(Emotion::Laughing).unwrap();
        w.next().unwrap();
        w.set_overlay_text("big\nnews").unwrap();
        w.next().unwrap();
        w.set_accent_color("blue".parse().unwrap()).unwrap();
        w.set_theme("neon city").unwrap();
        assert_eq!(w.step().index(), 4);
        w
    }

    async fn wizard_in_review(source: FakeSource) -> Wizard<FakeSource> {
        let mut w = wizard_at_theme(source).await;
        w.generate(&CancelToken::new(), |_| {}).await.unwrap();
        w
    }

    #[tokio::test]
    async fn gate_blocks_everything_until_granted() {
        let mut w = Wizard::new(FakeSource::default(), Duration::from_secs(5));
        assert_eq!(w.credential_state(), CredentialState::Unchecked);
        assert!(matches!(w.next(), Err(AppError::CredentialRequired)));

        let missing = FakeHost {
            has_key: false,
            can_select: false,
        };
        assert_eq!(w.check_credential(&missing).await, CredentialState::Missing);
        assert!(w.set_theme("x").is_err());
        assert!(w.select_credential(&missing).await.is_err());
        assert_eq!(w.credential_state(), CredentialState::Missing);

        let picker = FakeHost {
            has_key: false,
            can_select: true,
        };
        w.select_credential(&picker).await.unwrap();
        assert_eq!(w.credential_state(), CredentialState::Granted);
        w.next().unwrap();
        assert_eq!(w.step().index(), 1);
    }

    #[tokio::test]
    async fn steps_enforce_their_requirements() {
        let mut w = Wizard::new(FakeSource::default(), Duration::from_secs(5));
        w.check_credential(&GRANTED).await;
        assert!(matches!(w.prev(), Err(AppError::InvalidTransition { step: 0, .. })));

        w.next().unwrap();
        assert!(matches!(w.next(), Err(AppError::IncompleteDraft(_))));
        w.set_presenter(png(3)).unwrap();
        w.next().unwrap();
        w.next().unwrap();

        w.set_overlay_text(" \n ").unwrap();
        assert!(matches!(w.next(), Err(AppError::IncompleteDraft(_))));
        w.set_overlay_text("ok").unwrap();
        w.next().unwrap();

        assert!(matches!(w.next(), Err(AppError::InvalidTransition { step: 4, .. })));
        assert!(matches!(
            w.generate(&CancelToken::new(), |_| {}).await,
            Err(AppError::IncompleteDraft(_))
        ));

        w.prev().unwrap();
        assert_eq!(w.step().index(), 3);
    }

    #[tokio::test]
    async fn generate_yields_three_default_results() {
        let mut w = wizard_at_theme(FakeSource::default()).await;
        let mut progress = Vec::new();
        w.generate(&CancelToken::new(), |p| progress.push(p.percent()))
            .await
            .unwrap();

        assert_eq!(progress, [0, 33, 66, 100]);
        assert_eq!(w.step().index(), 5);

        let results = w.results().unwrap();
        assert_eq!(results.len(), BATCH_SIZE);
        for r in results {
            assert_eq!(r.params, crate::model::LayoutParams::default());
            assert_eq!(r.overlay_text, "BIG\nNEWS");
            assert_eq!(r.framing, Framing::Medium);
            assert!(!r.refining);
        }
        assert_ne!(results[0].id, results[1].id);
        assert_ne!(results[0].image, results[1].image);
        assert_eq!(w.review().unwrap().request.theme, "neon city");
    }

    #[tokio::test]
    async fn failed_generation_stays_on_theme_step() {
        let source = FakeSource {
            generate_failure: Some((1, Failure::Quota)),
            ..Default::default()
        };
        let mut w = wizard_at_theme(source).await;
        let err = w.generate(&CancelToken::new(), |_| {}).await.unwrap_err();

        assert!(matches!(err, AppError::QuotaExceeded(_)));
        assert_eq!(w.step().index(), 4);
        assert!(w.results().is_err());
        assert_eq!(w.credential_state(), CredentialState::Granted);
        assert_eq!(w.source().generated.get(), 1);
    }

    #[tokio::test]
    async fn invalid_key_closes_the_gate() {
        let source = FakeSource {
            generate_failure: Some((0, Failure::Credential)),
            ..Default::default()
        };
        let mut w = wizard_at_theme(source).await;
        let err = w.generate(&CancelToken::new(), |_| {}).await.unwrap_err();
        assert!(err.is_credential());
        assert_eq!(w.credential_state(), CredentialState::Missing);
        assert!(matches!(w.prev(), Err(AppError::CredentialRequired)));
    }

    #[tokio::test(start_paused = true)]
    async fn hung_generation_times_out() {
        let source = FakeSource {
            generate_failure: Some((2, Failure::Hang)),
            ..Default::default()
        };
        let mut w = wizard_at_theme(source).await;
        let err = w.generate(&CancelToken::new(), |_| {}).await.unwrap_err();
        assert!(matches!(err, AppError::Timeout { operation: "generate", .. }));
        assert_eq!(w.step().index(), 4);
    }

    #[tokio::test]
    async fn refining_one_slot_leaves_the_others_alone() {
        let mut w = wizard_in_review(FakeSource::default()).await;
        w.update_slot(
            1,
            &SlotUpdate {
                suggestion: Some("add lava".into()),
                ..Default::default()
            },
        )
        .unwrap();
        let before: Vec<_> = w.results().unwrap().to_vec();

        w.refine_slot(1, &CancelToken::new()).await.unwrap();

        let after = w.results().unwrap();
        assert_eq!(w.source().refine_suggestions.borrow().as_slice(), ["add lava"]);
        assert_ne!(after[1].image, before[1].image);
        assert_eq!(after[1].image, png(200));
        assert!(after[1].suggestion.is_empty());
        assert!(!after[1].refining);
        for j in [0, 2] {
            assert_eq!(after[j].image, before[j].image);
            assert_eq!(after[j].params, before[j].params);
            assert_eq!(after[j].suggestion, before[j].suggestion);
        }
    }

    #[tokio::test]
    async fn failed_refine_keeps_image_and_suggestion() {
        let source = FakeSource {
            refine_failure: Some(Failure::Network),
            ..Default::default()
        };
        let mut w = wizard_in_review(source).await;
        w.update_slot(0, &SlotUpdate {
            suggestion: Some("sunset".into()),
            ..Default::default()
        })
        .unwrap();
        let before = w.results().unwrap()[0].image.clone();

        let err = w.refine_slot(0, &CancelToken::new()).await.unwrap_err();
        assert!(matches!(err, AppError::GeminiApi(_)));

        let slot = &w.results().unwrap()[0];
        assert_eq!(slot.image, before);
        assert_eq!(slot.suggestion, "sunset");
        assert!(!slot.refining);
        assert_eq!(w.credential_state(), CredentialState::Granted);
    }

    #[tokio::test]
    async fn rejected_key_during_refine_closes_the_gate() {
        let source = FakeSource {
            refine_failure: Some(Failure::Credential),
            ..Default::default()
        };
        let mut w = wizard_in_review(source).await;
        let err = w.refine_slot(2, &CancelToken::new()).await.unwrap_err();
        assert!(err.is_credential());
        assert_eq!(w.credential_state(), CredentialState::Missing);
        assert!(!w.results().unwrap()[2].refining);
    }

    #[tokio::test]
    async fn tickets_mark_slots_and_reject_stale_answers() {
        let mut w = wizard_in_review(FakeSource::default()).await;
        let ticket = w.begin_refine(2).unwrap();
        assert!(w.results().unwrap()[2].refining);
        assert!(w.begin_refine(2).is_err());

        let cancel = CancelToken::new();
        let image = w.run_refine(&ticket, &cancel).await.unwrap();

        w.reset();
        assert!(matches!(
            w.finish_refine(ticket, Ok(image)),
            Err(AppError::StaleSlot(_))
        ));
    }

    #[tokio::test]
    async fn tickets_on_different_slots_finish_independently() {
        let mut w = wizard_in_review(FakeSource::default()).await;
        for (index, suggestion) in [(0, "storm clouds"), (2, "add lava")] {
            w.update_slot(
                index,
                &SlotUpdate {
                    suggestion: Some(suggestion.into()),
                    ..Default::default()
                },
            )
            .unwrap();
        }
        let before: Vec<_> = w.results().unwrap().to_vec();

        let first = w.begin_refine(0).unwrap();
        let second = w.begin_refine(2).unwrap();
        let cancel = CancelToken::new();
        let (a, b) = tokio::join!(w.run_refine(&first, &cancel), w.run_refine(&second, &cancel));
        a.unwrap();
        b.unwrap();
        let mut asked = w.source().refine_suggestions.borrow().clone();
        asked.sort();
        assert_eq!(asked, ["add lava", "storm clouds"]);

        w.finish_refine(second, Ok(png(222))).unwrap();
        let mid = w.results().unwrap();
        assert_eq!(mid[2].image, png(222));
        assert!(mid[2].suggestion.is_empty());
        assert!(!mid[2].refining);
        assert_eq!(mid[0].image, before[0].image);
        assert_eq!(mid[0].suggestion, "storm clouds");
        assert!(mid[0].refining);

        w.finish_refine(first, Ok(png(111))).unwrap();
        let after = w.results().unwrap();
        assert_eq!(after[0].image, png(111));
        assert!(after[0].suggestion.is_empty());
        assert!(!after[0].refining);
        assert_eq!(after[2].image, png(222));
        assert!(!after[2].refining);
        assert_eq!(after[1].image, before[1].image);
        assert!(!after[1].refining);
    }

    #[tokio::test]
    async fn failed_ticket_leaves_the_other_in_flight_slot_alone() {
        let mut w = wizard_in_review(FakeSource::default()).await;
        let before: Vec<_> = w.results().unwrap().to_vec();
        let first = w.begin_refine(0).unwrap();
        let second = w.begin_refine(1).unwrap();

        assert!(w.finish_refine(first, Err(AppError::gemini("connection reset"))).is_err());
        let mid = w.results().unwrap();
        assert_eq!(mid[0].image, before[0].image);
        assert!(!mid[0].refining);
        assert!(mid[1].refining);

        w.finish_refine(second, Ok(png(99))).unwrap();
        let after = w.results().unwrap();
        assert_eq!(after[0].image, before[0].image);
        assert_eq!(after[1].image, png(99));
    }

    #[tokio::test]
    async fn update_slot_clamps_and_targets_one_slot() {
        let mut w = wizard_in_review(FakeSource::default()).await;
        w.update_slot(
            0,
            &SlotUpdate {
                presenter_zoom: Some(3.0),
                overlay_text: Some("new title".into()),
                ..Default::default()
            },
        )
        .unwrap();
        let results = w.results().unwrap();
        assert_eq!(results[0].params.presenter_zoom, 2.0);
        assert_eq!(results[0].overlay_text, "NEW TITLE");
        assert_eq!(results[1].overlay_text, "BIG\nNEWS");
        assert!(matches!(
            w.update_slot(7, &SlotUpdate::default()),
            Err(AppError::SlotNotFound(7))
        ));
    }

    #[tokio::test]
    async fn reset_discards_batch_and_draft() {
        let mut w = wizard_in_review(FakeSource::default()).await;
        w.reset();
        assert!(matches!(w.step(), Step::Intro));
        assert!(w.results().is_err());
        assert!(w.draft().presenter.is_none());
        assert_eq!(w.draft().overlay_text, DEFAULT_OVERLAY_TEXT);
        assert_eq!(w.credential_state(), CredentialState::Granted);
    }

    #[tokio::test]
    async fn leaving_review_drops_results() {
        let mut w = wizard_in_review(FakeSource::default()).await;
        assert!(matches!(w.next(), Err(AppError::InvalidTransition { step: 5, .. })));
        w.prev().unwrap();
        assert_eq!(w.step().index(), 4);
        assert!(w.results().is_err());
        assert!(w.draft().presenter.is_some());
    }
}
