use std::time::Duration;

use http::StatusCode;

use super::*;
use crate::modal::ModalState;
use crate::stream::STREAM_CONTENT_TYPE;
use crate::transport::scripted::ScriptedTransport;

const LATENCY: Duration = Duration::from_millis(50);

const PAGE: &str = r#"
    <a id="open-cart" href="/cart" data-target-region="cart" data-disable-on-request="true">Cart</a>
    <a id="open-cart-late" href="/cart" data-target-region="cart"
       data-disable-on-request="true" data-open-on-response="true">Cart when ready</a>
    <a id="open-profile" href="/profile" data-target-region="profile">Profile</a>
    <div data-modal data-layer="z-50">
      <section data-content-region id="cart">
        <form id="rename" action="/profile/name" method="post"
              data-target-region="profile" data-resolve-by-target="true">
          <input type="text" name="name" value="Ada">
          <button type="submit">Rename</button>
        </form>
      </section>
    </div>
    <div data-modal data-layer="z-60"><section data-content-region id="profile"></section></div>
    <section data-content-region id="orders"><p>No orders</p></section>
"#;

fn html(status: StatusCode, body: &str) -> FetchResponse {
    FetchResponse::new(status, body.to_string()).with_content_type("text/html; charset=utf-8")
}

fn page_with(transport: &Arc<ScriptedTransport>) -> Page {
    Page::new(
        Document::parse(PAGE),
        Arc::clone(transport) as Arc<dyn Transport>,
        TimingConfig::default(),
        ZLayer::DEFAULT,
    )
}

fn setup() -> (Page, Arc<ScriptedTransport>) {
    let transport = Arc::new(ScriptedTransport::new(LATENCY));
    transport.respond("/cart", html(StatusCode::OK, "<p>Two items</p>"));
    transport.respond("/profile", html(StatusCode::OK, "<p>Ada Lovelace</p>"));
    (page_with(&transport), transport)
}

fn trigger(page: &Page, id: &str) -> NodeId {
    page.document()
        .triggers(&Scope::Document)
        .into_iter()
        .find(|element| element.id.as_deref() == Some(id))
        .map(|element| element.node)
        .unwrap()
}

fn state(page: &Page, region: &str) -> ModalState {
    page.controller(region).unwrap().state()
}

async fn open(page: &mut Page, id: &str) {
    let node = trigger(page, id);
    assert!(page.activate(node));
    page.run_for(Duration::from_millis(300)).await;
}

#[tokio::test(start_paused = true)]
async fn test_open_on_response_opens_with_content_and_releases_trigger() {
    let (mut page, _) = setup();
    let node = trigger(&page, "open-cart-late");

    assert!(page.activate(node));
    assert_eq!(state(&page, "cart"), ModalState::Closed);
    assert!(page.document().element(node).unwrap().disabled);

    page.run_for(Duration::from_millis(300)).await;

    let cart = page.controller("cart").unwrap();
    assert_eq!(cart.state(), ModalState::Open);
    assert_eq!(cart.trigger(), Some(node));
    assert_eq!(
        cart.machine().history().collect::<Vec<_>>(),
        vec![ModalState::Closed, ModalState::Opening, ModalState::Open]
    );
    assert_eq!(
        page.document().region_content("cart").as_deref(),
        Some("<p>Two items</p>")
    );
    assert!(page.document().region_has_attribute("cart", attr::COMPLETE));
    assert!(!page.document().is_dialog_hidden("cart"));
    assert!(!page.document().element(node).unwrap().disabled);
    assert_eq!(
        page.take_notices(),
        vec![PageNotice::ModalTarget {
            region: "cart".to_string()
        }]
    );
}

#[tokio::test(start_paused = true)]
async fn test_close_while_opening_is_dropped() {
    let (mut page, _) = setup();
    let node = trigger(&page, "open-cart");

    page.activate(node);
    assert!(page.controller("cart").unwrap().is_transitioning());
    assert_eq!(page.close("cart"), Some(CloseOutcome::Dropped));

    page.run_for(Duration::from_millis(300)).await;
    assert_eq!(page.close("cart"), Some(CloseOutcome::Accepted));
    assert_eq!(page.close("cart"), Some(CloseOutcome::AlreadyClosing));

    page.run_for(Duration::from_millis(300)).await;
    assert_eq!(page.close("cart"), Some(CloseOutcome::Ignored));
    assert!(page.document().is_dialog_hidden("cart"));
    assert_eq!(
        page.controller("cart").unwrap().machine().history().collect::<Vec<_>>(),
        vec![
            ModalState::Closed,
            ModalState::Opening,
            ModalState::Open,
            ModalState::Closing,
            ModalState::Closed,
        ]
    );
}

#[tokio::test(start_paused = true)]
async fn test_only_one_dialog_closes_at_a_time() {
    let (mut page, _) = setup();
    open(&mut page, "open-cart").await;
    open(&mut page, "open-profile").await;

    assert_eq!(page.close("cart"), Some(CloseOutcome::Accepted));
    assert_eq!(
        page.close("profile"),
        Some(CloseOutcome::Rejected {
            holder: "cart".to_string()
        })
    );
    assert_eq!(state(&page, "profile"), ModalState::Open);

    page.run_for(Duration::from_millis(300)).await;

    assert_eq!(page.close_lock().holder(), None);
    assert_eq!(page.close("profile"), Some(CloseOutcome::Accepted));
}

#[tokio::test(start_paused = true)]
async fn test_topmost_open_dialog_follows_layers() {
    let (mut page, _) = setup();
    assert!(page.topmost_open().is_none());

    open(&mut page, "open-cart").await;
    assert_eq!(page.topmost_open().map(ModalController::region), Some("cart"));

    open(&mut page, "open-profile").await;
    assert_eq!(page.topmost_open().map(ModalController::region), Some("profile"));
}

#[tokio::test(start_paused = true)]
async fn test_superseded_request_is_ignored() {
    let (mut page, transport) = setup();
    let node = trigger(&page, "open-profile");

    page.activate(node);
    page.activate(node);
    page.run_for(Duration::from_millis(300)).await;

    let profile = page.controller("profile").unwrap();
    assert_eq!(profile.state(), ModalState::Open);
    assert!(!profile.force_close_pending());
    assert!(!profile.has_active_request());
    assert_eq!(transport.requests().len(), 2);
    assert!(
        page.take_notices()
            .iter()
            .all(|notice| matches!(notice, PageNotice::ModalTarget { .. }))
    );
}

#[tokio::test(start_paused = true)]
async fn test_network_failure_force_closes() {
    let (mut page, transport) = setup();
    transport.fail("/orders-summary", TransportError::Network("connection refused".to_string()));
    open(&mut page, "open-profile").await;
    page.document().set_region_content(
        "profile",
        r#"<a id="summary" href="/orders-summary" data-target-region="profile">Summary</a>"#,
    );
    page.rebind(&Scope::Region("profile".to_string()));

    page.activate(trigger(&page, "summary"));
    page.run_for(Duration::from_millis(200)).await;
    assert!(page.controller("profile").unwrap().force_close_pending());
    assert_eq!(state(&page, "profile"), ModalState::Open);

    page.run_for(Duration::from_millis(1500)).await;

    let profile = page.controller("profile").unwrap();
    assert_eq!(profile.state(), ModalState::Closed);
    assert!(!profile.force_close_pending());
    assert!(page.take_notices().iter().any(|notice| matches!(
        notice,
        PageNotice::LoadFailed { region, .. } if region == "profile"
    )));
}

#[tokio::test(start_paused = true)]
async fn test_by_target_failure_stops_propagation() {
    let (mut page, transport) = setup();
    transport.respond(
        "/profile/name",
        html(
            StatusCode::UNPROCESSABLE_ENTITY,
            "<html><head><title>Validation failed</title></head><body><header>Name is taken</header></body></html>",
        ),
    );

    page.activate(trigger(&page, "rename"));
    page.run_for(Duration::from_millis(400)).await;

    let profile = page.controller("profile").unwrap();
    assert_eq!(profile.state(), ModalState::Open);
    let content = page.document().region_content("profile").unwrap();
    assert!(content.contains("Validation failed"));
    assert!(content.contains("Name is taken"));
    assert!(page.document().dialog("profile").unwrap().banners_visible);

    // The cart dialog around the form never saw the response.
    assert_eq!(state(&page, "cart"), ModalState::Closed);
    assert!(page.document().is_dialog_hidden("cart"));
}

#[tokio::test(start_paused = true)]
async fn test_by_target_success_closes_target_dialog() {
    let (mut page, transport) = setup();
    transport.respond("/profile/name", html(StatusCode::OK, "<p>Renamed</p>"));
    open(&mut page, "open-profile").await;

    page.activate(trigger(&page, "rename"));
    page.run_for(Duration::from_millis(400)).await;

    assert_eq!(state(&page, "profile"), ModalState::Closed);
    // The dialog the form sits in renders the result itself.
    assert_eq!(
        page.document().region_content("cart").as_deref(),
        Some("<p>Renamed</p>")
    );
}

#[tokio::test(start_paused = true)]
async fn test_form_response_is_processed_once() {
    let (mut page, _) = setup();
    let form = page.document().element(trigger(&page, "rename")).unwrap();
    let mut plain = form.clone();
    plain.flags.resolve_by_target = false;
    let origin = Origin::Form(plain);
    let signal = AbortSignal::detached();
    let response = html(StatusCode::INTERNAL_SERVER_ERROR, "");

    let mut flags = DispatchFlags {
        processing: true,
        ..DispatchFlags::default()
    };
    page.with_controller("profile", |controller, cx| {
        controller.on_before_response(cx, &origin, &signal, &response, &mut flags);
    });

    assert_eq!(state(&page, "profile"), ModalState::Closed);
    assert!(!flags.default_prevented);
}

#[tokio::test(start_paused = true)]
async fn test_deferred_open_skipped_after_abort() {
    let (mut page, _) = setup();
    let signal = AbortSignal::detached();
    signal.abort(OWN_ABORT_REASON);

    page.update(PageMsg::DeferredOpen {
        region: "profile".to_string(),
        signal,
    });

    assert_eq!(state(&page, "profile"), ModalState::Closed);
}

#[tokio::test(start_paused = true)]
async fn test_own_region_replacement_keeps_dialog_open() {
    let (mut page, _) = setup();
    open(&mut page, "open-cart").await;
    let before = page.document().region("cart").unwrap().node;

    page.push_stream(vec![StreamAction::replace("cart", "<p>Updated</p>")]);
    page.run_for(Duration::from_millis(200)).await;

    let region = page.document().region("cart").unwrap();
    assert_ne!(region.node, before);
    assert_eq!(region.content, "<p>Updated</p>");
    assert!(region.has_attribute(attr::MODAL_TARGET));
    assert!(!region.has_attribute(attr::AWAITING_REPLACEMENT));
    assert_eq!(
        page.registry().binding(region.node),
        Some(&Binding::Region {
            region: "cart".to_string()
        })
    );
    assert_eq!(state(&page, "cart"), ModalState::Open);
}

#[tokio::test(start_paused = true)]
async fn test_sibling_replacement_closes_open_dialog() {
    let (mut page, _) = setup();
    open(&mut page, "open-cart").await;

    page.push_stream(vec![StreamAction::replace("orders", "<p>1 order</p>")]);
    page.run_for(Duration::from_millis(600)).await;

    assert_eq!(state(&page, "cart"), ModalState::Closed);
    assert_eq!(
        page.document().region_content("orders").as_deref(),
        Some("<p>1 order</p>")
    );
}

#[tokio::test(start_paused = true)]
async fn test_stream_response_closes_dialog_once_shown() {
    let transport = Arc::new(ScriptedTransport::new(LATENCY));
    transport.respond(
        "/cart",
        FetchResponse::new(
            StatusCode::OK,
            r#"<turbo-stream action="replace" target="orders"><template><p>Checked out</p></template></turbo-stream>"#,
        )
        .with_content_type(STREAM_CONTENT_TYPE),
    );
    let mut page = page_with(&transport);

    page.activate(trigger(&page, "open-cart"));
    page.run_for(Duration::from_millis(800)).await;

    assert_eq!(
        page.document().region_content("orders").as_deref(),
        Some("<p>Checked out</p>")
    );
    let cart = page.controller("cart").unwrap();
    assert_eq!(cart.state(), ModalState::Closed);
    assert!(cart.machine().history().any(|state| state == ModalState::Open));
}

#[tokio::test(start_paused = true)]
async fn test_retry_reissues_the_failed_load() {
    let transport = Arc::new(ScriptedTransport::new(LATENCY));
    transport.respond("/cart", html(StatusCode::INTERNAL_SERVER_ERROR, "boom"));
    transport.respond("/cart", html(StatusCode::OK, "<p>Two items</p>"));
    let mut page = page_with(&transport);

    open(&mut page, "open-cart").await;
    assert_eq!(
        page.document().region_content("cart").as_deref(),
        Some(crate::interpret::FALLBACK_MESSAGE)
    );
    assert!(page.document().dialog("cart").unwrap().banners_visible);

    assert!(page.retry("cart"));
    page.run_for(Duration::from_millis(100)).await;

    assert_eq!(
        page.document().region_content("cart").as_deref(),
        Some("<p>Two items</p>")
    );
    assert!(!page.document().dialog("cart").unwrap().banners_visible);
    assert_eq!(transport.requests().len(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_load_builds_page_from_response() {
    let transport = Arc::new(ScriptedTransport::new(LATENCY));
    transport.respond("/", html(StatusCode::OK, PAGE));

    let page = Page::load(
        Arc::clone(&transport) as Arc<dyn Transport>,
        "/",
        TimingConfig::default(),
        ZLayer::DEFAULT,
    )
    .await
    .unwrap();

    assert_eq!(page.registry().regions(), vec!["cart".to_string(), "profile".to_string()]);
    assert_eq!(page.controller("cart").unwrap().layer(), ZLayer::parse("50").unwrap());

    let failing = Arc::new(ScriptedTransport::new(LATENCY));
    let result = Page::load(failing as Arc<dyn Transport>, "/", TimingConfig::default(), ZLayer::DEFAULT).await;
    assert!(result.is_err());
}

#[tokio::test(start_paused = true)]
async fn test_detach_forgets_controller_and_bindings() {
    let (mut page, _) = setup();
    let node = trigger(&page, "open-profile");
    assert!(page.registry().binding(node).is_some());

    let controller = page.detach("profile").unwrap();

    assert_eq!(controller.region(), "profile");
    assert!(page.controller("profile").is_none());
    assert!(page.registry().binding(node).is_none());
    assert!(page.detach("profile").is_none());
}

#[tokio::test(start_paused = true)]
async fn test_close_aborts_in_flight_load_and_releases_trigger() {
    let transport = Arc::new(ScriptedTransport::new(Duration::from_secs(2)));
    transport.respond("/cart", html(StatusCode::OK, "<p>Two items</p>"));
    let mut page = page_with(&transport);
    let node = trigger(&page, "open-cart");

    assert!(page.activate(node));
    page.run_for(Duration::from_millis(300)).await;
    assert_eq!(state(&page, "cart"), ModalState::Open);
    assert!(page.controller("cart").unwrap().has_active_request());
    assert!(page.document().element(node).unwrap().disabled);

    assert_eq!(page.close("cart"), Some(CloseOutcome::Accepted));
    assert!(!page.document().element(node).unwrap().disabled);
    assert!(!page.controller("cart").unwrap().has_active_request());

    page.run_for(Duration::from_millis(500)).await;

    assert_eq!(
        transport.outcomes(),
        vec![Err(TransportError::Aborted(OWN_ABORT_REASON.to_string()))]
    );
    let cart = page.controller("cart").unwrap();
    assert_eq!(cart.state(), ModalState::Closed);
    assert!(!cart.force_close_pending());
    assert!(
        !page
            .take_notices()
            .iter()
            .any(|notice| matches!(notice, PageNotice::LoadFailed { .. }))
    );
    assert_ne!(
        page.document().region_content("cart").as_deref(),
        Some("<p>Two items</p>")
    );
}

const FEEDBACK_FORM: &str = r#"
    <form id="feedback" action="/feedback" method="post" data-target-region="profile">
      <input type="text" name="text" value="hi">
      <button type="submit">Send</button>
    </form>
"#;

#[tokio::test(start_paused = true)]
async fn test_retry_reissues_form_replaced_by_its_error() {
    let transport = Arc::new(ScriptedTransport::new(LATENCY));
    transport.respond("/profile", html(StatusCode::OK, FEEDBACK_FORM));
    transport.respond("/feedback", html(StatusCode::INTERNAL_SERVER_ERROR, "boom"));
    transport.respond("/feedback", html(StatusCode::OK, "<p>Thanks</p>"));
    let mut page = page_with(&transport);
    open(&mut page, "open-profile").await;

    let form = trigger(&page, "feedback");
    assert!(page.activate(form));
    page.run_for(Duration::from_millis(300)).await;
    assert_eq!(
        page.document().region_content("profile").as_deref(),
        Some(crate::interpret::FALLBACK_MESSAGE)
    );
    assert!(!page.document().contains(form));

    assert!(page.retry("profile"));
    page.run_for(Duration::from_millis(300)).await;

    assert_eq!(
        page.document().region_content("profile").as_deref(),
        Some("<p>Thanks</p>")
    );
    assert_eq!(state(&page, "profile"), ModalState::Open);
    let requests = transport.requests();
    assert_eq!(requests.len(), 3);
    assert_eq!(requests[2].url, "/feedback");
    assert_eq!(requests[2].method, http::Method::POST);
    assert_eq!(requests[2].form, vec![("text".to_string(), "hi".to_string())]);
}

#[tokio::test(start_paused = true)]
async fn test_retry_reports_trigger_that_stays_disabled() {
    let transport = Arc::new(ScriptedTransport::new(LATENCY));
    transport.respond("/once", html(StatusCode::INTERNAL_SERVER_ERROR, "boom"));
    let mut page = page_with(&transport);
    assert!(!page.retry("profile"));

    page.document().set_region_content(
        "orders",
        r#"<a id="once" href="/once" data-target-region="profile"
              data-disable-on-request="true" data-keep-disabled="true">Once</a>"#,
    );
    page.rebind(&Scope::Region("orders".to_string()));
    open(&mut page, "once").await;
    assert!(page.document().element(trigger(&page, "once")).unwrap().disabled);

    assert!(!page.retry("profile"));

    assert_eq!(
        page.document().region_content("profile").as_deref(),
        Some(crate::interpret::FALLBACK_MESSAGE)
    );
    assert_eq!(transport.requests().len(), 1);
}

const HELP_DIALOG: &str = r#"
    <div data-modal data-layer="z-70">
      <section data-content-region id="help"><p>How can we help?</p></section>
    </div>
    <a id="open-help" href="/help" data-target-region="help">Help</a>
"#;

#[tokio::test(start_paused = true)]
async fn test_dialogs_follow_inserted_and_removed_content() {
    let (mut page, transport) = setup();
    transport.respond("/help", html(StatusCode::OK, "<p>FAQ</p>"));

    page.push_stream(vec![StreamAction::replace("orders", HELP_DIALOG)]);
    page.run_for(Duration::from_millis(600)).await;

    let region = page.document().region("help").unwrap();
    assert!(page.document().is_dialog_hidden("help"));
    assert_eq!(page.controller("help").unwrap().layer(), ZLayer::parse("70").unwrap());
    assert_eq!(
        page.registry().binding(region.node),
        Some(&Binding::Region {
            region: "help".to_string()
        })
    );
    let link = trigger(&page, "open-help");
    assert_eq!(
        page.registry().binding(link),
        Some(&Binding::Navigation {
            region: "help".to_string()
        })
    );

    open(&mut page, "open-help").await;
    assert_eq!(state(&page, "help"), ModalState::Open);
    assert_eq!(
        page.document().region_content("help").as_deref(),
        Some("<p>FAQ</p>")
    );

    page.push_stream(vec![StreamAction::replace("orders", "<p>No orders</p>")]);
    page.run_for(Duration::from_millis(600)).await;

    assert!(page.document().dialog("help").is_none());
    assert!(page.controller("help").is_none());
    assert!(page.registry().binding(region.node).is_none());
    assert!(page.registry().binding(link).is_none());
    assert_eq!(
        page.registry().regions(),
        vec!["cart".to_string(), "profile".to_string()]
    );
}
