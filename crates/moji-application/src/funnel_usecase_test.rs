use std::collections::HashSet;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use rand::SeedableRng;
use rand::rngs::StdRng;
use tokio::sync::mpsc;
use uuid::Uuid;

use moji_core::catalog::StyleId;
use moji_core::config::FunnelConfig;
use moji_core::content::{DAILY_SLOTS, HORSE_ACTION, HORSE_LONG_POOL, HORSE_SHORT_POOL, StickerState, Theme};
use moji_core::error::MojiError;
use moji_core::event::FunnelEvent;
use moji_core::ledger::RetryGrant;
use moji_core::session::{ImageRef, PhotoUpload, Stage, VideoRef};
use moji_interaction::{
    Order, PaymentError, PaymentService, Receipt, SynthesisError, SynthesisService,
};
use moji_infrastructure::MemoryLedgerRepository;

use crate::FunnelUseCase;

// Synthesis mock with switchable failure modes and call counters.
#[derive(Default)]
struct MockSynthesis {
    previews: AtomicUsize,
    stickers: AtomicUsize,
    clips: AtomicUsize,
    fail_previews: AtomicBool,
    fail_sticker_index: Option<usize>,
}

impl MockSynthesis {
    fn new() -> Self {
        Self::default()
    }

    fn failing_previews() -> Self {
        let mock = Self::default();
        mock.fail_previews.store(true, Ordering::SeqCst);
        mock
    }

    fn failing_sticker(index: usize) -> Self {
        Self {
            fail_sticker_index: Some(index),
            ..Self::default()
        }
    }
}

#[async_trait]
impl SynthesisService for MockSynthesis {
    async fn generate_preview(
        &self,
        _prompt: &str,
        seed: u64,
    ) -> Result<ImageRef, SynthesisError> {
        if self.fail_previews.load(Ordering::SeqCst) {
            return Err(SynthesisError::Backend("preview backend down".to_string()));
        }
        let n = self.previews.fetch_add(1, Ordering::SeqCst);
        Ok(ImageRef(format!("preview://{seed}/{n}")))
    }

    async fn generate_sticker(
        &self,
        identity: &str,
        index: usize,
        caption: &str,
    ) -> Result<ImageRef, SynthesisError> {
        if self.fail_sticker_index == Some(index) {
            return Err(SynthesisError::Backend(format!("slot {index} rejected")));
        }
        self.stickers.fetch_add(1, Ordering::SeqCst);
        Ok(ImageRef(format!("sticker://{identity}/{index}/{caption}")))
    }

    async fn animate(&self, image: &ImageRef) -> Result<VideoRef, SynthesisError> {
        self.clips.fetch_add(1, Ordering::SeqCst);
        Ok(VideoRef(format!("clip://{}", image.0)))
    }
}

// Payment mock whose outcome can be flipped mid-test.
struct ScriptedPayment {
    approve: AtomicBool,
    charges: AtomicUsize,
}

impl ScriptedPayment {
    fn approving() -> Self {
        Self {
            approve: AtomicBool::new(true),
            charges: AtomicUsize::new(0),
        }
    }

    fn declining() -> Self {
        Self {
            approve: AtomicBool::new(false),
            charges: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl PaymentService for ScriptedPayment {
    async fn charge(&self, order: &Order) -> Result<Receipt, PaymentError> {
        self.charges.fetch_add(1, Ordering::SeqCst);
        if self.approve.load(Ordering::SeqCst) {
            Ok(Receipt {
                id: Uuid::new_v4().to_string(),
                amount_cents: order.amount_cents,
                paid_at: Utc::now(),
            })
        } else {
            Err(PaymentError::Declined {
                reason: "insufficient funds".to_string(),
            })
        }
    }
}

async fn usecase_with(
    synthesis: Arc<MockSynthesis>,
    payment: Arc<ScriptedPayment>,
    config: FunnelConfig,
) -> FunnelUseCase {
    FunnelUseCase::new(
        config,
        synthesis,
        payment,
        Arc::new(MemoryLedgerRepository::new()),
    )
    .await
    .unwrap()
    .with_rng(StdRng::seed_from_u64(7))
}

async fn usecase(synthesis: Arc<MockSynthesis>, payment: Arc<ScriptedPayment>) -> FunnelUseCase {
    usecase_with(synthesis, payment, FunnelConfig::without_delays()).await
}

fn jpeg() -> PhotoUpload {
    PhotoUpload::new("me.jpg", "image/jpeg")
}

async fn drive_to_style_select(funnel: &mut FunnelUseCase) {
    funnel.submit_photo(jpeg()).await.unwrap();
    assert_eq!(funnel.session().stage, Stage::StyleSelect);
}

async fn drive_to_pay(funnel: &mut FunnelUseCase, theme: Theme) {
    drive_to_style_select(funnel).await;
    funnel.select_style(StyleId::Line).unwrap();
    funnel.generate_textures().await.unwrap();
    funnel.select_texture(2).unwrap();
    funnel.confirm_texture().unwrap();
    funnel.select_theme(theme).unwrap();
    funnel.proceed_to_pay().unwrap();
}

async fn drive_to_subset_select(funnel: &mut FunnelUseCase, theme: Theme) {
    drive_to_pay(funnel, theme).await;
    funnel.confirm_payment().await.unwrap();
    assert_eq!(funnel.session().stage, Stage::SubsetSelect);
}

#[tokio::test]
async fn end_to_end_daily_funnel() {
    let synthesis = Arc::new(MockSynthesis::new());
    let payment = Arc::new(ScriptedPayment::approving());
    let (tx, mut rx) = mpsc::unbounded_channel();
    let mut funnel = usecase(synthesis.clone(), payment.clone())
        .await
        .with_events(tx);

    funnel.submit_photo(jpeg()).await.unwrap();
    assert_eq!(funnel.session().stage, Stage::StyleSelect);
    assert_eq!(funnel.session().style_previews.len(), 4);

    funnel.select_style(StyleId::Line).unwrap();
    funnel.generate_textures().await.unwrap();
    assert_eq!(funnel.session().stage, Stage::TextureSelect);
    assert_eq!(funnel.session().texture_previews.len(), 4);

    funnel.select_texture(2).unwrap();
    let identity = funnel.confirm_texture().unwrap();
    assert!(identity.starts_with("identity_"));
    assert_eq!(funnel.session().stage, Stage::SceneSelect);

    funnel.select_theme(Theme::Daily).unwrap();
    funnel.proceed_to_pay().unwrap();
    let receipt = funnel.confirm_payment().await.unwrap();
    assert_eq!(receipt.amount_cents, 690);
    assert_eq!(payment.charges.load(Ordering::SeqCst), 1);

    // The batch holds 12 stickers matching the daily slot table.
    let stickers = &funnel.session().stickers;
    assert_eq!(stickers.len(), 12);
    for (slot, sticker) in DAILY_SLOTS.iter().zip(stickers.iter()) {
        assert_eq!(sticker.index, slot.index);
        assert_eq!(sticker.state, slot.state);
        assert_eq!(sticker.action, slot.action);
        assert!(slot.state.pool().contains(&sticker.caption.as_str()));
        assert!(sticker.image.is_some());
    }
    let captions: HashSet<&str> = stickers.iter().map(|s| s.caption.as_str()).collect();
    assert_eq!(captions.len(), 12, "no caption repeats within the batch");

    for index in 4..12 {
        assert!(funnel.toggle_sticker(index).unwrap());
    }
    let grant = funnel.start_animation().await.unwrap();
    assert_eq!(funnel.session().stage, Stage::Done);
    assert_eq!(grant.expires_at - grant.issued_at, chrono::TimeDelta::hours(1));
    assert_eq!(synthesis.clips.load(Ordering::SeqCst), 8);

    // Clips come back in ascending sticker-index order.
    let clip_order: Vec<usize> = funnel
        .session()
        .clips
        .iter()
        .map(|clip| clip.sticker_index)
        .collect();
    assert_eq!(clip_order, (4..12).collect::<Vec<_>>());
    assert!(funnel.session().clips.iter().all(|c| c.video.is_some()));
    assert!(funnel.download_grant().is_ok());

    // Stage events arrive in funnel order, with per-item progress between.
    let mut stages = Vec::new();
    let mut slot_progress = 0;
    let mut clip_progress = 0;
    while let Ok(event) = rx.try_recv() {
        match event {
            FunnelEvent::StageChanged { stage } => stages.push(stage),
            FunnelEvent::SlotProgress { .. } => slot_progress += 1,
            FunnelEvent::ClipProgress { .. } => clip_progress += 1,
            FunnelEvent::SlotDegraded { .. } => panic!("no slot should degrade"),
        }
    }
    assert_eq!(
        stages,
        vec![
            Stage::StylesGenerating,
            Stage::StyleSelect,
            Stage::TexturesGenerating,
            Stage::TextureSelect,
            Stage::SceneSelect,
            Stage::Pay,
            Stage::BatchGenerating,
            Stage::SubsetSelect,
            Stage::AnimatingBatch,
            Stage::Done,
        ]
    );
    assert_eq!(slot_progress, 12);
    assert_eq!(clip_progress, 8);
}

#[tokio::test]
async fn wrong_stage_operation_is_rejected_without_mutation() {
    let synthesis = Arc::new(MockSynthesis::new());
    let payment = Arc::new(ScriptedPayment::approving());
    let mut funnel = usecase(synthesis, payment).await;

    let before = funnel.session().clone();

    assert!(funnel.select_style(StyleId::Line).unwrap_err().is_invalid_stage());
    assert!(funnel.select_texture(0).unwrap_err().is_invalid_stage());
    assert!(funnel.confirm_texture().unwrap_err().is_invalid_stage());
    assert!(funnel.proceed_to_pay().unwrap_err().is_invalid_stage());
    assert!(funnel.confirm_payment().await.unwrap_err().is_invalid_stage());
    assert!(funnel.toggle_sticker(0).unwrap_err().is_invalid_stage());
    assert!(funnel.start_animation().await.unwrap_err().is_invalid_stage());
    assert!(funnel.regenerate_styles().await.unwrap_err().is_invalid_stage());

    assert_eq!(funnel.session(), &before);
}

#[tokio::test]
async fn unsupported_media_type_is_rejected() {
    let synthesis = Arc::new(MockSynthesis::new());
    let payment = Arc::new(ScriptedPayment::approving());
    let mut funnel = usecase(synthesis.clone(), payment).await;

    let err = funnel
        .submit_photo(PhotoUpload::new("clip.gif", "image/gif"))
        .await
        .unwrap_err();
    assert!(matches!(err, MojiError::UnsupportedFormat { .. }));

    // Rejection is local: nothing was recorded, nothing was requested.
    assert_eq!(funnel.session().stage, Stage::Upload);
    assert!(funnel.session().photo.is_none());
    assert_eq!(synthesis.previews.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn preview_failure_reverts_to_upload() {
    let synthesis = Arc::new(MockSynthesis::failing_previews());
    let payment = Arc::new(ScriptedPayment::approving());
    let mut funnel = usecase(synthesis, payment).await;

    let err = funnel.submit_photo(jpeg()).await.unwrap_err();
    assert!(err.is_retriable());
    assert_eq!(funnel.session().stage, Stage::Upload);
    assert!(funnel.session().style_previews.is_empty());
}

#[tokio::test]
async fn regeneration_grants_then_bills() {
    let synthesis = Arc::new(MockSynthesis::new());
    let payment = Arc::new(ScriptedPayment::approving());
    let mut funnel = usecase(synthesis, payment).await;
    drive_to_style_select(&mut funnel).await;

    assert_eq!(funnel.remaining_free_retries(), 2);
    assert_eq!(funnel.regenerate_styles().await.unwrap(), RetryGrant::Granted);
    assert_eq!(funnel.regenerate_styles().await.unwrap(), RetryGrant::Granted);
    assert_eq!(funnel.regenerate_styles().await.unwrap(), RetryGrant::Billable);
    assert_eq!(funnel.remaining_free_retries(), 0);

    // The billable round still regenerated; progress is never blocked.
    assert_eq!(funnel.session().stage, Stage::StyleSelect);
    assert_eq!(funnel.session().style_previews.len(), 4);
}

#[tokio::test]
async fn quota_persists_across_usecases_for_same_session() {
    let repository = Arc::new(MemoryLedgerRepository::new());
    let synthesis = Arc::new(MockSynthesis::new());
    let payment = Arc::new(ScriptedPayment::approving());

    let mut first = FunnelUseCase::for_session(
        "funnel-1".to_string(),
        FunnelConfig::without_delays(),
        synthesis.clone(),
        payment.clone(),
        repository.clone(),
    )
    .await
    .unwrap()
    .with_rng(StdRng::seed_from_u64(1));

    drive_to_style_select(&mut first).await;
    first.regenerate_styles().await.unwrap();
    assert_eq!(first.remaining_free_retries(), 1);
    drop(first);

    let mut second = FunnelUseCase::for_session(
        "funnel-1".to_string(),
        FunnelConfig::without_delays(),
        synthesis,
        payment,
        repository,
    )
    .await
    .unwrap();
    assert_eq!(second.remaining_free_retries(), 1);
}

#[tokio::test]
async fn regeneration_refreshes_seed_and_clears_choice() {
    let synthesis = Arc::new(MockSynthesis::new());
    let payment = Arc::new(ScriptedPayment::approving());
    let mut funnel = usecase(synthesis, payment).await;
    drive_to_style_select(&mut funnel).await;

    funnel.select_style(StyleId::Crayon).unwrap();
    let old_seed = funnel.session().style_seed;
    let old_previews = funnel.session().style_previews.clone();

    funnel.regenerate_styles().await.unwrap();

    assert!(funnel.session().selected_style.is_none());
    assert_ne!(funnel.session().style_seed, old_seed);
    assert_ne!(funnel.session().style_previews, old_previews);
}

#[tokio::test]
async fn horse_theme_draws_greeting_captions() {
    let synthesis = Arc::new(MockSynthesis::new());
    let payment = Arc::new(ScriptedPayment::approving());
    let mut funnel = usecase(synthesis, payment).await;
    drive_to_subset_select(&mut funnel, Theme::Horse).await;

    let stickers = &funnel.session().stickers;
    assert_eq!(stickers.len(), 12);

    let long = stickers
        .iter()
        .filter(|s| HORSE_LONG_POOL.contains(&s.caption.as_str()))
        .count();
    let short = stickers
        .iter()
        .filter(|s| HORSE_SHORT_POOL.contains(&s.caption.as_str()))
        .count();
    assert_eq!(long, 9);
    assert_eq!(short, 3);

    for sticker in stickers {
        assert_eq!(sticker.state, StickerState::Ack);
        assert_eq!(sticker.action, HORSE_ACTION);
    }
}

#[tokio::test]
async fn failed_slot_degrades_to_placeholder() {
    let synthesis = Arc::new(MockSynthesis::failing_sticker(5));
    let payment = Arc::new(ScriptedPayment::approving());
    let (tx, mut rx) = mpsc::unbounded_channel();
    let mut funnel = usecase(synthesis, payment).await.with_events(tx);

    drive_to_subset_select(&mut funnel, Theme::Daily).await;

    let stickers = &funnel.session().stickers;
    assert_eq!(stickers.len(), 12, "a failed slot never aborts the batch");
    for sticker in stickers {
        if sticker.index == 5 {
            assert!(sticker.image.is_none());
        } else {
            assert!(sticker.image.is_some());
        }
    }

    let degraded: Vec<usize> = std::iter::from_fn(|| rx.try_recv().ok())
        .filter_map(|event| match event {
            FunnelEvent::SlotDegraded { index } => Some(index),
            _ => None,
        })
        .collect();
    assert_eq!(degraded, vec![5]);
}

#[tokio::test]
async fn declined_payment_keeps_session_in_pay() {
    let synthesis = Arc::new(MockSynthesis::new());
    let payment = Arc::new(ScriptedPayment::declining());
    let mut funnel = usecase(synthesis, payment.clone()).await;
    drive_to_pay(&mut funnel, Theme::Daily).await;

    let err = funnel.confirm_payment().await.unwrap_err();
    assert!(matches!(err, MojiError::PaymentDeclined { .. }));
    assert_eq!(funnel.session().stage, Stage::Pay);
    assert!(funnel.session().identity.is_some());
    assert!(funnel.session().stickers.is_empty());

    // The user retries after the decline is resolved; nothing was lost.
    payment.approve.store(true, Ordering::SeqCst);
    funnel.confirm_payment().await.unwrap();
    assert_eq!(funnel.session().stage, Stage::SubsetSelect);
}

#[tokio::test]
async fn incomplete_subset_blocks_animation() {
    let synthesis = Arc::new(MockSynthesis::new());
    let payment = Arc::new(ScriptedPayment::approving());
    let mut funnel = usecase(synthesis, payment).await;
    drive_to_subset_select(&mut funnel, Theme::Daily).await;

    for index in 0..7 {
        funnel.toggle_sticker(index).unwrap();
    }
    let err = funnel.start_animation().await.unwrap_err();
    assert!(matches!(
        err,
        MojiError::SelectionIncomplete {
            selected: 7,
            required: 8
        }
    ));
    assert_eq!(funnel.session().stage, Stage::SubsetSelect);
}

#[tokio::test]
async fn subset_is_capped_at_target() {
    let synthesis = Arc::new(MockSynthesis::new());
    let payment = Arc::new(ScriptedPayment::approving());
    let mut funnel = usecase(synthesis, payment).await;
    drive_to_subset_select(&mut funnel, Theme::Daily).await;

    for index in 0..8 {
        assert!(funnel.toggle_sticker(index).unwrap());
    }
    // At capacity the ninth toggle is ignored, not an error.
    assert!(!funnel.toggle_sticker(8).unwrap());
    assert_eq!(funnel.session().subset.len(), 8);

    assert!(!funnel.toggle_sticker(3).unwrap());
    assert!(funnel.toggle_sticker(8).unwrap());
    assert!(funnel.session().subset.is_satisfied());
}

#[tokio::test]
async fn reset_clears_funnel_but_not_ledger() {
    let synthesis = Arc::new(MockSynthesis::new());
    let payment = Arc::new(ScriptedPayment::approving());
    let mut funnel = usecase(synthesis, payment).await;
    drive_to_style_select(&mut funnel).await;
    funnel.regenerate_styles().await.unwrap();
    assert_eq!(funnel.remaining_free_retries(), 1);

    funnel.reset();

    assert_eq!(funnel.session().stage, Stage::Upload);
    assert!(funnel.session().photo.is_none());
    assert!(funnel.session().style_previews.is_empty());
    assert_eq!(funnel.remaining_free_retries(), 1, "reset never refunds quota");

    // The funnel is immediately usable again.
    funnel.submit_photo(jpeg()).await.unwrap();
    assert_eq!(funnel.session().stage, Stage::StyleSelect);
}

#[tokio::test]
async fn expired_grant_surfaces_and_reissue_replaces_it() {
    let synthesis = Arc::new(MockSynthesis::new());
    let payment = Arc::new(ScriptedPayment::approving());
    let mut config = FunnelConfig::without_delays();
    config.grant_ttl = Duration::ZERO;
    let mut funnel = usecase_with(synthesis, payment, config).await;

    drive_to_subset_select(&mut funnel, Theme::Daily).await;
    for index in 0..8 {
        funnel.toggle_sticker(index).unwrap();
    }
    let first = funnel.start_animation().await.unwrap();

    let err = funnel.download_grant().unwrap_err();
    assert!(err.is_expired_grant());

    let second = funnel.reissue_grant().unwrap();
    assert_ne!(second.token, first.token);
}
