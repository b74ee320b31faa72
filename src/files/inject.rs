//! Live-reload client script injection.

/// The script served inside injectable documents. Connects back to the
/// notification endpoint (`NOTIFY_PATH`) and acts on the three wire
/// messages.
pub const CLIENT_SCRIPT: &str = r#"<script>
// Injected by live-serve
(function () {
  if (window.__liveServeSocket) { return; }
  var proto = location.protocol === "https:" ? "wss:" : "ws:";
  var socket = new WebSocket(proto + "//" + location.host + "/__live_serve");
  socket.onmessage = function (msg) {
    if (msg.data === "reload") {
      location.reload();
    } else if (msg.data === "refreshcss") {
      var links = document.getElementsByTagName("link");
      for (var i = 0; i < links.length; i++) {
        var link = links[i];
        if (link.rel !== "stylesheet") { continue; }
        var href = link.href.replace(/(&|\?)_ls=\d+/, "");
        link.href = href + (href.indexOf("?") >= 0 ? "&" : "?") + "_ls=" + Date.now();
      }
    }
  };
  window.__liveServeSocket = socket;
})();
</script>"#;

/// Extensions that identify an injectable document. A path with no
/// extension counts as injectable too.
const INJECTABLE_EXTENSIONS: &[&str] = &["html", "htm", "xhtml", "php"];

/// Whether a resolved file may receive the client script.
pub fn is_injectable(path: &std::path::Path) -> bool {
    match path.extension().and_then(|e| e.to_str()) {
        None => true,
        Some(ext) => {
            let ext = ext.to_ascii_lowercase();
            INJECTABLE_EXTENSIONS.iter().any(|known| *known == ext)
        }
    }
}

/// Splice `script` immediately before the first case-insensitive `</body>`
/// occurrence. A document without the tag is returned unmodified.
pub fn inject_before_body_close(doc: Vec<u8>, script: &str) -> Vec<u8> {
    match find_body_close(&doc) {
        None => doc,
        Some(at) => {
            let mut out = Vec::with_capacity(doc.len() + script.len());
            out.extend_from_slice(&doc[..at]);
            out.extend_from_slice(script.as_bytes());
            out.extend_from_slice(&doc[at..]);
            out
        }
    }
}

fn find_body_close(doc: &[u8]) -> Option<usize> {
    const TAG: &[u8] = b"</body>";
    doc.windows(TAG.len())
        .position(|window| window.eq_ignore_ascii_case(TAG))
}
