//! End-to-end tests: scripts running in the real runtime, driven by the
//! host loop, against a temp bundle and a mock transport.

use std::path::{Path, PathBuf};
use std::rc::Rc;
use std::sync::Arc;
use std::time::Duration;

use lumo_host::{Frame, Host, HostConfig};
use lumo_net::{Transport, TransportError, TransportRequest, TransportResponse};
use std::cell::RefCell;

struct MockTransport;

impl Transport for MockTransport {
    fn fetch(&self, request: &TransportRequest) -> Result<TransportResponse, TransportError> {
        match request.url.as_str() {
            "https://example/ok" => Ok(TransportResponse {
                status: 200,
                status_text: "OK".to_string(),
                headers: vec![("Content-Type".to_string(), "text/plain".to_string())],
                body: b"remote payload".to_vec(),
            }),
            "https://example/missing" => Ok(TransportResponse {
                status: 404,
                status_text: "Not Found".to_string(),
                headers: vec![],
                body: b"gone".to_vec(),
            }),
            "https://example/cached" => Ok(TransportResponse {
                status: 304,
                status_text: "Not Modified".to_string(),
                headers: vec![],
                body: Vec::new(),
            }),
            _ => Err(TransportError::Network("unreachable".to_string())),
        }
    }
}

fn bundle_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("lumo-host-tests-{name}"));
    std::fs::create_dir_all(&dir).unwrap();
    std::fs::write(dir.join("data.json"), b"{\"headline\":\"hello\"}").unwrap();
    let png = image::RgbaImage::from_pixel(2, 3, image::Rgba([1, 2, 3, 255]));
    png.save(dir.join("tiny.png")).unwrap();
    dir
}

type FrameLog = Rc<RefCell<Vec<(u32, u32)>>>;

fn test_host(bundle: &Path) -> (Host, FrameLog) {
    let frames: FrameLog = Rc::new(RefCell::new(Vec::new()));
    let log = Rc::clone(&frames);
    let config = HostConfig {
        display_width: 64,
        display_height: 48,
        bundle_dir: bundle.to_path_buf(),
        ..HostConfig::default()
    };
    let host = Host::with_transport(
        config,
        move |frame: Frame| log.borrow_mut().push((frame.width(), frame.height())),
        Arc::new(MockTransport),
    );
    (host, frames)
}

fn eval_true(host: &mut Host, expr: &str) -> bool {
    host.runtime()
        .execute(expr)
        .ok()
        .and_then(|value| value.as_boolean())
        .unwrap_or(false)
}

fn run(host: &mut Host, source: &str) {
    host.runtime().execute(source).expect("script should evaluate");
}

/// Tick until `expr` evaluates true (async completions need a few loop
/// iterations to marshal back).
fn tick_until(host: &mut Host, expr: &str) {
    for _ in 0..200 {
        host.tick();
        if eval_true(host, expr) {
            return;
        }
        std::thread::sleep(Duration::from_millis(5));
    }
    panic!("condition never became true: {expr}");
}

// ========== timers ==========

#[test]
fn zero_delay_timeout_runs_on_a_later_iteration_with_args() {
    let (mut host, _) = test_host(&bundle_dir("timeout"));
    run(
        &mut host,
        "globalThis.result = null;
         setTimeout((a, b) => { globalThis.result = a + b; }, 0, 'x', 'y');",
    );
    assert!(
        eval_true(&mut host, "globalThis.result === null"),
        "callback must not run synchronously in the registering stack"
    );
    host.tick();
    assert!(eval_true(&mut host, "globalThis.result === 'xy'"));
}

#[test]
fn clear_timeout_cancels_a_pending_zero_delay_timer() {
    let (mut host, _) = test_host(&bundle_dir("cleartimeout"));
    run(
        &mut host,
        "globalThis.hit = false;
         const id = setTimeout(() => { globalThis.hit = true; }, 0);
         clearTimeout(id);
         clearTimeout(id);",
    );
    host.tick();
    host.tick();
    assert!(eval_true(&mut host, "globalThis.hit === false"));
}

#[test]
fn set_interval_repeats_until_cleared() {
    let (mut host, _) = test_host(&bundle_dir("interval"));
    run(
        &mut host,
        "globalThis.n = 0;
         globalThis.id = setInterval(() => { globalThis.n += 1; }, 1);",
    );
    tick_until(&mut host, "globalThis.n >= 2");
    run(&mut host, "clearInterval(globalThis.id); globalThis.frozen = globalThis.n;");
    host.tick();
    std::thread::sleep(Duration::from_millis(10));
    host.tick();
    assert!(eval_true(&mut host, "globalThis.n === globalThis.frozen"));
}

// ========== animation frames ==========

#[test]
fn raf_callbacks_registered_during_a_tick_run_in_the_next_tick() {
    let (mut host, _) = test_host(&bundle_dir("raf"));
    run(
        &mut host,
        "globalThis.count = 0;
         requestAnimationFrame((stamp) => {
             globalThis.count += 1;
             globalThis.stamp = stamp;
             requestAnimationFrame(() => { globalThis.count += 10; });
         });",
    );
    host.tick();
    assert!(
        eval_true(&mut host, "globalThis.count === 1"),
        "the nested registration must not join the running batch"
    );
    host.tick();
    assert!(eval_true(&mut host, "globalThis.count === 11"));
    assert!(eval_true(&mut host, "typeof globalThis.stamp === 'number' && globalThis.stamp >= 0"));
}

#[test]
fn cancel_animation_frame_removes_the_pending_callback() {
    let (mut host, _) = test_host(&bundle_dir("cancelraf"));
    run(
        &mut host,
        "globalThis.ran = false;
         const id = requestAnimationFrame(() => { globalThis.ran = true; });
         cancelAnimationFrame(id);",
    );
    host.tick();
    assert!(eval_true(&mut host, "globalThis.ran === false"));
}

// ========== canvas & frames ==========

#[test]
fn dirty_canvas_publishes_one_frame_per_tick() {
    let (mut host, frames) = test_host(&bundle_dir("canvas"));
    run(
        &mut host,
        "const canvas = document.createElement('canvas');
         canvas.width = 32;
         canvas.height = 16;
         document.body.appendChild(canvas);
         const ctx = canvas.getContext('2d');
         ctx.fillStyle = 'red';
         ctx.fillRect(0, 0, 32, 16);",
    );
    host.tick();
    assert_eq!(frames.borrow().as_slice(), &[(32, 16)]);

    // Clean canvas: no frame on the next tick.
    host.tick();
    assert_eq!(frames.borrow().len(), 1);

    run(&mut host, "document.body.getElementsByTagName('canvas')[0].getContext('2d').fillRect(0, 0, 1, 1);");
    host.tick();
    assert_eq!(frames.borrow().len(), 2);
}

#[test]
fn unsupported_context_operations_are_silently_accepted() {
    let (mut host, _) = test_host(&bundle_dir("noops"));
    run(
        &mut host,
        "const canvas = document.createElement('canvas');
         canvas.width = 8;
         canvas.height = 8;
         const ctx = canvas.getContext('2d');
         ctx.stroke();
         ctx.arc();
         ctx.rotate(1.5);
         ctx.scale(2, 2);
         ctx.bezierCurveTo(1, 2, 3, 4, 5, 6);
         globalThis.measured = ctx.measureText('hi');
         globalThis.ok = typeof globalThis.measured.width === 'number';",
    );
    assert!(eval_true(&mut host, "globalThis.ok === true"));
}

#[test]
fn save_restore_round_trips_visible_context_state() {
    let (mut host, _) = test_host(&bundle_dir("saverestore"));
    run(
        &mut host,
        "const canvas = document.createElement('canvas');
         const ctx = canvas.getContext('2d');
         ctx.globalAlpha = 0.25;
         ctx.globalCompositeOperation = 'multiply';
         ctx.save();
         ctx.globalAlpha = 1;
         ctx.globalCompositeOperation = 'copy';
         ctx.restore();
         globalThis.ok = ctx.globalAlpha === 0.25 && ctx.globalCompositeOperation === 'multiply';",
    );
    assert!(eval_true(&mut host, "globalThis.ok === true"));
}

// ========== DOM ==========

#[test]
fn element_lookup_is_shallow_and_identity_stable() {
    let (mut host, _) = test_host(&bundle_dir("shallow"));
    run(
        &mut host,
        "const parent = document.createElement('div');
         const child = document.createElement('div');
         const grand = document.createElement('div');
         child.id = 'c';
         grand.id = 'g';
         parent.appendChild(child);
         child.appendChild(grand);
         globalThis.missesGrandchild = parent.getElementById('g') === null;
         globalThis.findsChild = parent.getElementById('c') === child;",
    );
    assert!(eval_true(&mut host, "globalThis.missesGrandchild === true"));
    assert!(eval_true(&mut host, "globalThis.findsChild === true"));
}

#[test]
fn hash_assignment_fires_the_hashchange_listener() {
    let (mut host, _) = test_host(&bundle_dir("hash"));
    run(
        &mut host,
        "globalThis.changed = 0;
         addEventListener('hashchange', () => { globalThis.changed += 1; });
         window.location.hash = '#news';",
    );
    assert!(eval_true(&mut host, "globalThis.changed === 1"));
    assert!(eval_true(&mut host, "window.getHash() === '#news'"));
    assert!(eval_true(&mut host, "window.location.hash === '#news'"));
}

#[test]
fn window_reports_the_configured_display_size() {
    let (mut host, _) = test_host(&bundle_dir("display"));
    assert!(eval_true(&mut host, "window.innerWidth === 64"));
    assert!(eval_true(&mut host, "window.innerHeight === 48"));
}

// ========== XHR ==========

#[test]
fn bundled_xhr_completes_synchronously_with_the_file_contents() {
    let (mut host, _) = test_host(&bundle_dir("xhr-bundle"));
    run(
        &mut host,
        "globalThis.events = [];
         const xhr = new XMLHttpRequest();
         xhr.onreadystatechange = () => { globalThis.events.push('rsc' + xhr.readyState); };
         xhr.open('GET', './data.json');
         xhr.send();
         globalThis.text = xhr.responseText;
         globalThis.code = xhr.status;",
    );
    assert!(eval_true(&mut host, "globalThis.events.join(',') === 'rsc1,rsc4'"));
    assert!(eval_true(&mut host, "globalThis.text === '{\"headline\":\"hello\"}'"));
    assert!(eval_true(&mut host, "globalThis.code === 200"));
    assert!(eval_true(&mut host, "XMLHttpRequest.DONE === 4"));
}

#[test]
fn network_404_fires_onerror_never_onload() {
    let (mut host, _) = test_host(&bundle_dir("xhr-404"));
    run(
        &mut host,
        "globalThis.flow = [];
         const xhr = new XMLHttpRequest();
         globalThis.xhr = xhr;
         xhr.onload = () => globalThis.flow.push('load');
         xhr.onerror = () => globalThis.flow.push('error');
         xhr.onloadend = () => globalThis.flow.push('end');
         xhr.open('GET', 'https://example/missing');
         xhr.send();",
    );
    tick_until(&mut host, "globalThis.flow.length >= 2");
    assert!(eval_true(&mut host, "globalThis.flow.join(',') === 'error,end'"));
    assert!(eval_true(&mut host, "globalThis.xhr.status === 404"));
}

#[test]
fn network_304_sets_status_without_further_callbacks() {
    let (mut host, _) = test_host(&bundle_dir("xhr-304"));
    run(
        &mut host,
        "globalThis.calls = 0;
         const xhr = new XMLHttpRequest();
         globalThis.xhr = xhr;
         xhr.open('GET', 'https://example/cached');
         xhr.onload = () => { globalThis.calls += 1; };
         xhr.onreadystatechange = () => { globalThis.calls += 1; };
         xhr.send();",
    );
    tick_until(&mut host, "globalThis.xhr.status === 304");
    host.tick();
    // One readystatechange fired at send time (LOADING); nothing after.
    assert!(eval_true(&mut host, "globalThis.calls === 1"));
    assert!(eval_true(&mut host, "globalThis.xhr.readyState === 3"));
}

#[test]
fn successful_network_fetch_delivers_text_in_order() {
    let (mut host, _) = test_host(&bundle_dir("xhr-ok"));
    run(
        &mut host,
        "globalThis.flow = [];
         const xhr = new XMLHttpRequest();
         globalThis.xhr = xhr;
         xhr.onreadystatechange = () => globalThis.flow.push('rsc' + xhr.readyState);
         xhr.onload = () => globalThis.flow.push('load');
         xhr.onloadend = () => globalThis.flow.push('end');
         xhr.open('GET', 'https://example/ok');
         xhr.send();",
    );
    tick_until(&mut host, "globalThis.xhr.readyState === 4");
    assert!(eval_true(
        &mut host,
        "globalThis.flow.join(',') === 'rsc1,rsc3,rsc4,load,end'"
    ));
    assert!(eval_true(&mut host, "globalThis.xhr.responseText === 'remote payload'"));
    assert!(eval_true(
        &mut host,
        "globalThis.xhr.getResponseHeader('content-type') === 'text/plain'"
    ));
}

// ========== images ==========

#[test]
fn bundled_image_load_populates_dimensions_and_fires_onload() {
    let (mut host, _) = test_host(&bundle_dir("image"));
    run(
        &mut host,
        "globalThis.loaded = null;
         const img = new Image();
         img.onload = () => { globalThis.loaded = img.width + 'x' + img.height; };
         img.onerror = () => { globalThis.loaded = 'error'; };
         img.src = './tiny.png';",
    );
    assert!(eval_true(&mut host, "globalThis.loaded === '2x3'"));
}

#[test]
fn missing_bundled_image_fires_onerror_with_no_arguments() {
    let (mut host, _) = test_host(&bundle_dir("image-err"));
    run(
        &mut host,
        "globalThis.outcome = null;
         const img = new Image();
         img.onload = () => { globalThis.outcome = 'load'; };
         img.onerror = (...args) => { globalThis.outcome = 'error' + args.length; };
         img.src = './absent.png';",
    );
    assert!(eval_true(&mut host, "globalThis.outcome === 'error0'"));
}

// ========== error containment ==========

#[test]
fn a_throwing_callback_does_not_halt_the_engine() {
    let (mut host, _) = test_host(&bundle_dir("throw"));
    run(
        &mut host,
        "globalThis.after = false;
         setTimeout(() => { throw new Error('boom'); }, 0);
         setTimeout(() => { globalThis.after = true; }, 0);",
    );
    host.tick();
    assert!(eval_true(&mut host, "globalThis.after === true"));
    host.runtime().execute_logged("inline", "throw new Error('still alive?')");
    assert!(eval_true(&mut host, "1 + 1 === 2"));
}
