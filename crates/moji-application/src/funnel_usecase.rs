//! The generation funnel use case.
//!
//! `FunnelUseCase` sequences one session through
//! upload, style previews, texture previews, scene choice, payment, batch
//! generation, subset selection, and animation. All collaborator calls are
//! sequential; at most one synthesis or payment request is in flight per
//! session, and waiting periods are plain awaits inside the single
//! controller.

use std::sync::Arc;

use chrono::Utc;
use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};
use tokio::sync::mpsc;
use tokio::time::sleep;
use uuid::Uuid;

use moji_core::catalog::{STYLES, StyleId, style_option};
use moji_core::config::FunnelConfig;
use moji_core::content::{DAILY_SLOTS, HORSE_ACTION, StickerState, Theme};
use moji_core::error::{MojiError, Result};
use moji_core::event::FunnelEvent;
use moji_core::grant::DownloadGrant;
use moji_core::ledger::{LedgerRepository, RetryGrant, RetryLedger};
use moji_core::sampler::{ContentSampler, draw_horse_captions};
use moji_core::session::{
    AnimatedClip, BATCH_SIZE, PhotoUpload, PreviewAsset, Session, Stage, Sticker, StylePreview,
};
use moji_core::throttle::UploadThrottle;
use moji_interaction::{Order, PaymentError, PaymentService, Receipt, SynthesisService};

/// Synthesis attempts per batch slot before it degrades to a placeholder.
const SLOT_ATTEMPTS: usize = 3;

/// Texture variants generated per preview round.
const TEXTURE_VARIANTS: usize = 4;

/// Drives one session through the generation funnel.
///
/// The use case owns the session state and the session-scoped policy
/// components (ledger, throttle) and talks to synthesis and payment
/// through injected trait objects. Every public operation is guarded by
/// the current stage; an operation invoked in the wrong stage returns
/// [`MojiError::InvalidStage`] and mutates nothing.
pub struct FunnelUseCase {
    session: Session,
    config: FunnelConfig,
    /// Daily free-regeneration quota, persisted through the repository
    /// after every consumption.
    ledger: RetryLedger,
    throttle: UploadThrottle,
    synthesis: Arc<dyn SynthesisService>,
    payment: Arc<dyn PaymentService>,
    ledger_repository: Arc<dyn LedgerRepository>,
    /// Best-effort progress channel toward the presentation layer.
    events: Option<mpsc::UnboundedSender<FunnelEvent>>,
    rng: StdRng,
}

impl FunnelUseCase {
    /// Creates a use case for a brand-new session.
    ///
    /// # Errors
    ///
    /// Returns an error if the ledger repository cannot be read.
    pub async fn new(
        config: FunnelConfig,
        synthesis: Arc<dyn SynthesisService>,
        payment: Arc<dyn PaymentService>,
        ledger_repository: Arc<dyn LedgerRepository>,
    ) -> Result<Self> {
        Self::for_session(
            Uuid::new_v4().to_string(),
            config,
            synthesis,
            payment,
            ledger_repository,
        )
        .await
    }

    /// Creates a use case bound to a known session id.
    ///
    /// The id keys the ledger, so resuming under the same id on the same
    /// day continues the already-consumed quota instead of granting a
    /// fresh one.
    pub async fn for_session(
        session_id: String,
        config: FunnelConfig,
        synthesis: Arc<dyn SynthesisService>,
        payment: Arc<dyn PaymentService>,
        ledger_repository: Arc<dyn LedgerRepository>,
    ) -> Result<Self> {
        let today = Utc::now().date_naive();
        let ledger = match ledger_repository.load(&session_id).await? {
            Some(ledger) => ledger,
            None => RetryLedger::new(today, config.daily_free_retries),
        };
        let throttle = UploadThrottle::new(&config.throttle);

        Ok(Self {
            session: Session::with_id(session_id),
            config,
            ledger,
            throttle,
            synthesis,
            payment,
            ledger_repository,
            events: None,
            rng: StdRng::from_entropy(),
        })
    }

    /// Attaches a progress event channel.
    pub fn with_events(mut self, sender: mpsc::UnboundedSender<FunnelEvent>) -> Self {
        self.events = Some(sender);
        self
    }

    /// Replaces the random source, for reproducible runs.
    pub fn with_rng(mut self, rng: StdRng) -> Self {
        self.rng = rng;
        self
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Free regenerations left today, applying date rollover.
    pub fn remaining_free_retries(&mut self) -> u32 {
        self.ledger.peek(Utc::now().date_naive())
    }

    /// Accepts the source photo and produces the style preview set.
    ///
    /// Valid in [`Stage::Upload`] only. The declared media type must be
    /// JPEG or PNG. The upload counts toward the abuse window; an
    /// abnormal upload rate stretches the processing delay but never
    /// blocks the upload. On synthesis failure the stage reverts to
    /// `Upload` with no partial preview set.
    pub async fn submit_photo(&mut self, upload: PhotoUpload) -> Result<()> {
        self.require_stage(Stage::Upload, "submit_photo")?;
        if !upload.is_supported() {
            return Err(MojiError::unsupported_format(upload.media_type));
        }

        let penalty = self.throttle.record(Utc::now());
        if !penalty.is_zero() {
            tracing::warn!(
                "abnormal upload rate for session {} ({} recent), delaying {:?}",
                self.session.id,
                self.throttle.recent_uploads(),
                penalty
            );
        }
        self.session.photo = Some(upload);

        self.set_stage(Stage::StylesGenerating);
        sleep(self.config.upload_processing + penalty).await;

        let seed = self.rng.next_u64();
        match self.render_style_previews(seed).await {
            Ok(previews) => {
                self.session.style_seed = seed;
                self.session.style_previews = previews;
                self.set_stage(Stage::StyleSelect);
                Ok(())
            }
            Err(err) => {
                self.session.style_previews.clear();
                self.set_stage(Stage::Upload);
                Err(err)
            }
        }
    }

    /// Records the style choice. Does not advance the stage.
    pub fn select_style(&mut self, style: StyleId) -> Result<()> {
        self.require_stage(Stage::StyleSelect, "select_style")?;
        self.session.selected_style = Some(style);
        Ok(())
    }

    /// Regenerates the style preview set under a fresh seed.
    ///
    /// Consumes one free regeneration if any remain; an exhausted ledger
    /// still regenerates but the returned grant marks the round as
    /// billable. The current style choice is cleared. On synthesis
    /// failure the previous preview set stays in place.
    pub async fn regenerate_styles(&mut self) -> Result<RetryGrant> {
        self.require_stage(Stage::StyleSelect, "regenerate_styles")?;
        let grant = self.consume_retry().await?;

        self.session.selected_style = None;
        self.set_stage(Stage::StylesGenerating);
        sleep(self.config.regen_delay).await;

        let seed = self.rng.next_u64();
        match self.render_style_previews(seed).await {
            Ok(previews) => {
                self.session.style_seed = seed;
                self.session.style_previews = previews;
                self.set_stage(Stage::StyleSelect);
                Ok(grant)
            }
            Err(err) => {
                self.set_stage(Stage::StyleSelect);
                Err(err)
            }
        }
    }

    /// Produces the texture preview set for the chosen style.
    ///
    /// Valid in [`Stage::StyleSelect`] with a style selected. On failure
    /// the stage reverts to `StyleSelect` with no partial set.
    pub async fn generate_textures(&mut self) -> Result<()> {
        self.require_stage(Stage::StyleSelect, "generate_textures")?;
        let style = self
            .session
            .selected_style
            .ok_or_else(|| MojiError::missing_selection("style"))?;

        self.session.selected_texture = None;
        self.set_stage(Stage::TexturesGenerating);
        sleep(self.config.texture_generation_delay).await;

        let seed = self.rng.next_u64();
        match self.render_texture_previews(style, seed).await {
            Ok(previews) => {
                self.session.texture_seed = seed;
                self.session.texture_previews = previews;
                self.set_stage(Stage::TextureSelect);
                Ok(())
            }
            Err(err) => {
                self.session.texture_previews.clear();
                self.set_stage(Stage::StyleSelect);
                Err(err)
            }
        }
    }

    /// Records the texture choice. Does not advance the stage.
    pub fn select_texture(&mut self, index: usize) -> Result<()> {
        self.require_stage(Stage::TextureSelect, "select_texture")?;
        if index >= self.session.texture_previews.len() {
            return Err(MojiError::out_of_range("texture", index));
        }
        self.session.selected_texture = Some(index);
        Ok(())
    }

    /// Regenerates the texture preview set under a fresh seed.
    ///
    /// Same quota semantics as [`FunnelUseCase::regenerate_styles`].
    pub async fn regenerate_textures(&mut self) -> Result<RetryGrant> {
        self.require_stage(Stage::TextureSelect, "regenerate_textures")?;
        let style = self
            .session
            .selected_style
            .ok_or_else(|| MojiError::missing_selection("style"))?;
        let grant = self.consume_retry().await?;

        self.session.selected_texture = None;
        self.set_stage(Stage::TexturesGenerating);
        sleep(self.config.regen_delay).await;

        let seed = self.rng.next_u64();
        match self.render_texture_previews(style, seed).await {
            Ok(previews) => {
                self.session.texture_seed = seed;
                self.session.texture_previews = previews;
                self.set_stage(Stage::TextureSelect);
                Ok(grant)
            }
            Err(err) => {
                self.set_stage(Stage::TextureSelect);
                Err(err)
            }
        }
    }

    /// Confirms the texture choice and mints the identity reference used
    /// to request the final batch.
    pub fn confirm_texture(&mut self) -> Result<String> {
        self.require_stage(Stage::TextureSelect, "confirm_texture")?;
        if self.session.selected_texture.is_none() {
            return Err(MojiError::missing_selection("texture"));
        }

        let identity = format!("identity_{}", Uuid::new_v4().simple());
        self.session.identity = Some(identity.clone());
        self.set_stage(Stage::SceneSelect);
        Ok(identity)
    }

    /// Records the batch theme. Does not advance the stage.
    pub fn select_theme(&mut self, theme: Theme) -> Result<()> {
        self.require_stage(Stage::SceneSelect, "select_theme")?;
        self.session.theme = theme;
        Ok(())
    }

    /// Moves the session to the payment stage.
    pub fn proceed_to_pay(&mut self) -> Result<()> {
        self.require_stage(Stage::SceneSelect, "proceed_to_pay")?;
        self.set_stage(Stage::Pay);
        Ok(())
    }

    /// Charges the order and, on success, generates the sticker batch.
    ///
    /// A declined charge leaves the session in [`Stage::Pay`] with every
    /// funnel choice intact; the user can retry. Batch generation itself
    /// never fails: a slot whose synthesis exhausts its attempts degrades
    /// to a placeholder entry instead of aborting the batch.
    pub async fn confirm_payment(&mut self) -> Result<Receipt> {
        self.require_stage(Stage::Pay, "confirm_payment")?;
        let identity = self
            .session
            .identity
            .clone()
            .ok_or_else(|| MojiError::internal("payment without a confirmed identity"))?;

        let order = Order {
            identity,
            theme: self.session.theme,
            amount_cents: self.config.price_cents,
            summary: "12张静态PNG + 8张动态GIF".to_string(),
        };
        let receipt = match self.payment.charge(&order).await {
            Ok(receipt) => receipt,
            Err(PaymentError::Declined { reason }) => {
                return Err(MojiError::payment_declined(reason));
            }
            Err(PaymentError::Backend(message)) => {
                return Err(MojiError::internal(message));
            }
        };
        tracing::info!(
            "charge captured for session {} (receipt {})",
            self.session.id,
            receipt.id
        );

        self.set_stage(Stage::BatchGenerating);
        self.generate_batch().await;
        self.set_stage(Stage::SubsetSelect);
        Ok(receipt)
    }

    /// Toggles a sticker in the animation subset.
    ///
    /// Returns whether the sticker is selected afterwards. Toggling an
    /// unselected sticker while the subset is full is a silent no-op.
    pub fn toggle_sticker(&mut self, index: usize) -> Result<bool> {
        self.require_stage(Stage::SubsetSelect, "toggle_sticker")?;
        if index >= self.session.stickers.len() {
            return Err(MojiError::out_of_range("sticker", index));
        }
        Ok(self.session.subset.toggle(index))
    }

    /// Animates the chosen subset and completes the funnel.
    ///
    /// Requires exactly the target number of stickers selected. Clips are
    /// produced strictly in ascending sticker-index order, one at a time;
    /// a failed or imageless item yields no clip but never aborts the
    /// run. Finishes by issuing the download grant and entering
    /// [`Stage::Done`].
    pub async fn start_animation(&mut self) -> Result<DownloadGrant> {
        self.require_stage(Stage::SubsetSelect, "start_animation")?;
        if !self.session.subset.is_satisfied() {
            return Err(MojiError::SelectionIncomplete {
                selected: self.session.subset.len(),
                required: self.session.subset.target(),
            });
        }

        self.set_stage(Stage::AnimatingBatch);

        let chosen: Vec<usize> = self.session.subset.iter().collect();
        let total = chosen.len();
        let mut clips = Vec::with_capacity(total);
        for (done, sticker_index) in chosen.into_iter().enumerate() {
            sleep(self.config.clip_render_delay).await;

            let image = self.session.stickers[sticker_index].image.clone();
            let video = match image {
                Some(image) => match self.synthesis.animate(&image).await {
                    Ok(video) => Some(video),
                    Err(err) => {
                        tracing::warn!("clip for sticker {sticker_index} failed: {err}");
                        None
                    }
                },
                None => {
                    tracing::warn!("sticker {sticker_index} has no image, skipping clip");
                    None
                }
            };
            clips.push(AnimatedClip {
                sticker_index,
                video,
            });
            self.emit(FunnelEvent::ClipProgress {
                sticker_index,
                completed: done + 1,
                total,
            });
        }
        self.session.clips = clips;

        let grant = DownloadGrant::issue(&mut self.rng, Utc::now(), self.config.grant_ttl);
        self.session.grant = Some(grant.clone());
        self.set_stage(Stage::Done);
        Ok(grant)
    }

    /// Returns the current grant while it is valid.
    ///
    /// # Errors
    ///
    /// [`MojiError::ExpiredGrant`] once the expiry has passed; the caller
    /// should request a fresh grant.
    pub fn download_grant(&self) -> Result<&DownloadGrant> {
        self.require_stage(Stage::Done, "download_grant")?;
        let grant = self
            .session
            .grant
            .as_ref()
            .ok_or_else(|| MojiError::internal("done stage without a grant"))?;
        if grant.is_expired(Utc::now()) {
            return Err(MojiError::ExpiredGrant);
        }
        Ok(grant)
    }

    /// Mints a replacement grant after the previous one expired.
    pub fn reissue_grant(&mut self) -> Result<DownloadGrant> {
        self.require_stage(Stage::Done, "reissue_grant")?;
        let grant = DownloadGrant::issue(&mut self.rng, Utc::now(), self.config.grant_ttl);
        self.session.grant = Some(grant.clone());
        Ok(grant)
    }

    /// Restores the session to its initial values.
    ///
    /// Legal from any stage. The ledger is date-scoped and stays as it
    /// is; only the funnel state and the upload history are cleared. An
    /// in-flight collaborator result arriving after a reset belongs to no
    /// stage and is dropped by construction, since the controller is not
    /// awaiting it anymore.
    pub fn reset(&mut self) {
        tracing::debug!("resetting session {}", self.session.id);
        self.session.reset();
        self.throttle.clear();
        self.emit(FunnelEvent::StageChanged {
            stage: Stage::Upload,
        });
    }

    async fn render_style_previews(&mut self, seed: u64) -> Result<Vec<StylePreview>> {
        let mut previews = Vec::with_capacity(STYLES.len());
        for style in STYLES.iter() {
            let image = self
                .synthesis
                .generate_preview(style.prompt, seed)
                .await
                .map_err(|err| MojiError::synthesis(err.to_string()))?;
            previews.push(StylePreview {
                style: style.id,
                asset: PreviewAsset { image, seed },
            });
        }
        Ok(previews)
    }

    async fn render_texture_previews(
        &mut self,
        style: StyleId,
        seed: u64,
    ) -> Result<Vec<PreviewAsset>> {
        let prompt = style_option(style).prompt;
        let mut previews = Vec::with_capacity(TEXTURE_VARIANTS);
        for index in 0..TEXTURE_VARIANTS {
            let variant_seed = seed.wrapping_add(index as u64);
            let image = self
                .synthesis
                .generate_preview(prompt, variant_seed)
                .await
                .map_err(|err| MojiError::synthesis(err.to_string()))?;
            previews.push(PreviewAsset {
                image,
                seed: variant_seed,
            });
        }
        Ok(previews)
    }

    /// Produces the 12 batch stickers for the chosen theme.
    ///
    /// Captions for the daily theme are drawn slot by slot through one
    /// shared sampler, so no caption repeats within the batch unless its
    /// pool is exhausted. Slot synthesis gets up to [`SLOT_ATTEMPTS`]
    /// attempts; a slot that fails them all is recorded as a placeholder.
    async fn generate_batch(&mut self) {
        let identity = self.session.identity.clone().unwrap_or_default();

        let captions: Vec<String> = match self.session.theme {
            Theme::Daily => {
                let mut sampler = ContentSampler::new();
                DAILY_SLOTS
                    .iter()
                    .map(|slot| sampler.pick(&mut self.rng, slot.state.pool()))
                    .collect()
            }
            Theme::Horse => draw_horse_captions(&mut self.rng),
        };

        let mut stickers = Vec::with_capacity(BATCH_SIZE);
        for (index, caption) in captions.iter().enumerate() {
            self.emit(FunnelEvent::SlotProgress {
                current: index + 1,
                total: BATCH_SIZE,
            });

            let mut image = None;
            for attempt in 1..=SLOT_ATTEMPTS {
                sleep(self.config.slot_attempt_delay).await;
                match self
                    .synthesis
                    .generate_sticker(&identity, index, caption)
                    .await
                {
                    Ok(result) => {
                        image = Some(result);
                        break;
                    }
                    Err(err) => {
                        tracing::warn!("slot {index} attempt {attempt} failed: {err}");
                    }
                }
            }
            if image.is_none() {
                tracing::warn!("slot {index} degraded to placeholder");
                self.emit(FunnelEvent::SlotDegraded { index });
            }

            let (state, action) = match self.session.theme {
                Theme::Daily => {
                    let slot = &DAILY_SLOTS[index];
                    (slot.state, slot.action.to_string())
                }
                Theme::Horse => (StickerState::Ack, HORSE_ACTION.to_string()),
            };
            stickers.push(Sticker {
                index,
                state,
                caption: caption.clone(),
                action,
                image,
            });
        }

        self.session.stickers = stickers;
        self.session.subset.clear();
    }

    async fn consume_retry(&mut self) -> Result<RetryGrant> {
        let today = Utc::now().date_naive();
        let grant = self.ledger.consume(today);
        self.ledger_repository
            .save(&self.session.id, &self.ledger)
            .await?;
        Ok(grant)
    }

    fn require_stage(&self, expected: Stage, operation: &'static str) -> Result<()> {
        if self.session.stage == expected {
            Ok(())
        } else {
            Err(MojiError::invalid_stage(
                operation,
                expected,
                self.session.stage,
            ))
        }
    }

    fn set_stage(&mut self, stage: Stage) {
        tracing::debug!(
            "session {}: {:?} -> {:?}",
            self.session.id,
            self.session.stage,
            stage
        );
        self.session.stage = stage;
        self.emit(FunnelEvent::StageChanged { stage });
    }

    fn emit(&self, event: FunnelEvent) {
        if let Some(sender) = &self.events {
            // Nobody listening is fine; progress is best effort.
            let _ = sender.send(event);
        }
    }
}
