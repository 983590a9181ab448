//! Presentation glue: the login form and the denoise control page.

use axum::response::Html;

pub fn login(error: Option<&str>, next: &str) -> Html<String> {
    let error = error.unwrap_or("");
    let next = escape(next);
    Html(format!(
        r#"<!doctype html>
<html>
<head>
  <meta charset="utf-8" />
  <title>Login</title>
  <style>
    body {{ font-family: sans-serif; background: #111; color: #eee; height: 100vh;
            display: flex; align-items: center; justify-content: center; }}
    .card {{ width: 360px; background: #1b1b1b; border: 1px solid #333;
             border-radius: 12px; padding: 16px; }}
    input {{ width: 100%; padding: 10px; margin-top: 8px; border-radius: 8px;
             box-sizing: border-box; border: 1px solid #333; background: #0f0f0f; color: #eee; }}
    button {{ width: 100%; margin-top: 12px; padding: 10px; border-radius: 8px;
              border: 0; cursor: pointer; }}
    .err {{ color: #ff6b6b; min-height: 18px; margin-top: 8px; }}
    .muted {{ opacity: 0.7; font-size: 13px; }}
  </style>
</head>
<body>
  <div class="card">
    <h3 style="margin:0 0 6px 0;">noisegate</h3>
    <div class="muted">Login to continue</div>
    <form method="post" action="/login">
      <input type="hidden" name="next" value="{next}" />
      <input name="username" placeholder="Username" autocomplete="username" />
      <input name="password" placeholder="Password" type="password" autocomplete="current-password" />
      <div class="err">{error}</div>
      <button type="submit">Login</button>
    </form>
  </div>
</body>
</html>
"#
    ))
}

pub const DENOISE_PAGE: &str = r#"<!doctype html>
<html>
<head>
  <meta charset="utf-8" />
  <title>Denoise folder</title>
  <style>
    body { font-family: sans-serif; padding: 16px; }
    .row { margin: 10px 0; display: flex; gap: 10px; align-items: center; flex-wrap: wrap; }
    button { padding: 8px 12px; cursor: pointer; }
    pre { background: #111; color: #0f0; padding: 10px; min-height: 140px; white-space: pre-wrap; }
    .muted { opacity: 0.7; }
  </style>
</head>
<body>
  <h2>Folder &rarr; PNG sequence &rarr; denoise &rarr; ZIP</h2>

  <div class="row">
    <label><b>Select folder:</b></label>
    <input id="folder" type="file" webkitdirectory multiple />
  </div>
  <div class="row">
    <label class="muted">Strength:</label>
    <input id="strength" type="number" min="0" max="5" step="0.1" value="1.0" />
  </div>
  <div class="row">
    <button id="run" type="button">Denoise + Download ZIP</button>
  </div>

  <pre id="log"></pre>
  <p><a href="/logout">Logout</a></p>

  <script>
    const log = (s) => { document.getElementById("log").textContent += s + "\n"; };

    document.getElementById("run").addEventListener("click", async () => {
      const files = Array.from(document.getElementById("folder").files || []);
      const pngs = files.filter((f) => /\.png$/i.test(f.name));
      pngs.sort((a, b) => (a.webkitRelativePath || a.name).localeCompare(b.webkitRelativePath || b.name));
      if (!pngs.length) return log("No PNG files selected.");

      const strength = parseFloat(document.getElementById("strength").value || "1.0");
      const form = new FormData();
      for (const f of pngs) form.append("files", f, f.webkitRelativePath || f.name);

      log(`Uploading ${pngs.length} PNG(s), strength ${strength} ...`);
      const r = await fetch(`/denoise/sequence.zip?strength=${encodeURIComponent(strength)}`, {
        method: "POST",
        body: form,
      });
      if (!r.ok) return log(`ERROR HTTP ${r.status}: ${await r.text()}`);

      const blob = await r.blob();
      const a = document.createElement("a");
      a.href = URL.createObjectURL(blob);
      a.download = "denoised_sequence.zip";
      a.click();
      URL.revokeObjectURL(a.href);
      log(`Done, ${blob.size} bytes.`);
    });
  </script>
</body>
</html>
"#;

fn escape(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn next_value_is_html_escaped() {
        let Html(page) = login(None, "/x\"><script>");
        assert!(page.contains("value=\"/x&quot;&gt;&lt;script&gt;\""));
        assert!(!page.contains("\"><script>"));
    }
}
