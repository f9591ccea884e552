//! Embedded HTML/CSS/JS frontend for the dupdash web dashboard.
//!
//! The entire SPA is compiled into the binary as a string constant.
//! No external assets, no build tools, no CDN dependencies.

/// The complete single-page dashboard HTML.
pub const INDEX_HTML: &str = r##"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>Duplicate APIs Detection</title>
<style>
:root {
  --bg: #0d1117;
  --surface: #161b22;
  --border: #30363d;
  --text: #e6edf3;
  --text-muted: #8b949e;
  --accent: #58a6ff;
  --green: #3fb950;
  --red: #f85149;
  --high: #ef4444;
  --medium: #f97316;
  --low: #eab308;
  --radius: 8px;
  --font: -apple-system, BlinkMacSystemFont, 'Segoe UI', Helvetica, Arial, sans-serif;
  --mono: 'SF Mono', 'Cascadia Code', 'Fira Code', monospace;
}

* { margin: 0; padding: 0; box-sizing: border-box; }
body {
  background: var(--bg);
  color: var(--text);
  font-family: var(--font);
  font-size: 14px;
  line-height: 1.5;
}

/* Layout */
.layout { display: flex; min-height: 100vh; }

aside {
  width: 220px;
  flex-shrink: 0;
  background: var(--surface);
  border-right: 1px solid var(--border);
  padding: 20px 12px;
}

aside .brand {
  font-family: var(--mono);
  font-weight: 700;
  color: var(--accent);
  margin: 0 8px 20px;
}

aside a {
  display: block;
  padding: 8px 10px;
  border-radius: 6px;
  color: var(--text-muted);
  text-decoration: none;
  margin-bottom: 2px;
}

aside a:hover { color: var(--text); background: rgba(255,255,255,0.04); }
aside a.active { background: var(--accent); color: #fff; }

main { flex: 1; padding: 24px; max-width: 1200px; }

header {
  display: flex;
  align-items: center;
  justify-content: space-between;
  margin-bottom: 24px;
  padding-bottom: 16px;
  border-bottom: 1px solid var(--border);
}

header h1 { font-size: 22px; font-weight: 600; }
header .subtitle { color: var(--text-muted); font-size: 13px; }

/* Buttons */
.btn {
  padding: 8px 16px;
  border-radius: 6px;
  border: 1px solid var(--border);
  background: var(--surface);
  color: var(--text);
  font-size: 13px;
  font-weight: 500;
  cursor: pointer;
}

.btn.primary { background: var(--accent); border-color: var(--accent); color: #fff; }
.btn:disabled { opacity: 0.6; cursor: wait; }

/* Cards */
.card {
  background: var(--surface);
  border: 1px solid var(--border);
  border-radius: var(--radius);
  padding: 20px;
  margin-bottom: 16px;
}

.card h2 { font-size: 16px; font-weight: 600; margin-bottom: 16px; }

/* Analytics frame */
.frame-wrap { position: relative; height: 480px; }
.frame-wrap iframe { width: 100%; height: 100%; border: 0; border-radius: 6px; }
.frame-state {
  position: absolute;
  inset: 0;
  display: flex;
  align-items: center;
  justify-content: center;
  color: var(--text-muted);
  background: var(--surface);
}

/* Error panel */
.error-panel {
  display: none;
  align-items: center;
  justify-content: space-between;
  gap: 12px;
  border: 1px solid var(--red);
  color: var(--red);
  background: rgba(248,81,73,0.08);
  border-radius: var(--radius);
  padding: 12px 16px;
  margin-bottom: 16px;
}

.error-panel.show { display: flex; }

/* Stats grid */
.stats-grid {
  display: grid;
  grid-template-columns: repeat(auto-fit, minmax(200px, 1fr));
  gap: 16px;
  margin-bottom: 24px;
}

.stat-card {
  background: var(--surface);
  border: 1px solid var(--border);
  border-radius: var(--radius);
  padding: 20px;
  text-align: center;
}

.stat-card .value {
  font-size: 32px;
  font-weight: 700;
  font-family: var(--mono);
  color: var(--accent);
  line-height: 1.1;
}

.stat-card .value.high { color: var(--high); }
.stat-card .value.medium { color: var(--medium); }
.stat-card .value.low { color: var(--low); }

.stat-card .label {
  font-size: 12px;
  color: var(--text-muted);
  margin-top: 6px;
  text-transform: uppercase;
  letter-spacing: 0.5px;
}

/* Tabs */
.tabs {
  display: flex;
  flex-wrap: wrap;
  gap: 4px;
  margin-bottom: 16px;
  background: var(--surface);
  border: 1px solid var(--border);
  border-radius: var(--radius);
  padding: 4px;
}

.tabs button {
  padding: 6px 12px;
  border: none;
  border-radius: 6px;
  background: transparent;
  color: var(--text-muted);
  font-size: 13px;
  cursor: pointer;
}

.tabs button.active { background: var(--accent); color: #fff; }
.tabs .count {
  margin-left: 6px;
  padding: 0 6px;
  border-radius: 10px;
  background: rgba(255,255,255,0.12);
  font-size: 11px;
}

.search {
  width: 100%;
  padding: 8px 12px;
  margin-bottom: 16px;
  border-radius: 6px;
  border: 1px solid var(--border);
  background: var(--bg);
  color: var(--text);
}

/* Groups */
.group { border: 1px solid var(--border); border-radius: var(--radius); margin-bottom: 12px; }
.group-head {
  display: flex;
  align-items: center;
  gap: 12px;
  padding: 12px 16px;
  cursor: pointer;
}

.group-head .score { font-family: var(--mono); font-weight: 700; font-size: 18px; }
.group-head .level {
  font-size: 11px;
  font-weight: 600;
  padding: 2px 8px;
  border-radius: 10px;
  border: 1px solid currentColor;
}

.group-head .meta { color: var(--text-muted); margin-left: auto; }
.group-body { display: none; padding: 0 16px 16px; }
.group.open .group-body { display: block; }

.pair {
  display: grid;
  grid-template-columns: 1fr auto 1fr;
  gap: 12px;
  align-items: start;
  border-top: 1px solid var(--border);
  padding-top: 12px;
  margin-top: 12px;
}

.api .name { font-weight: 600; }
.api .sub { color: var(--text-muted); font-size: 12px; }
.api .cat {
  display: inline-block;
  font-size: 11px;
  padding: 0 6px;
  border-radius: 10px;
  color: #fff;
  margin-top: 4px;
}

.pair .arrow { font-family: var(--mono); color: var(--text-muted); text-align: center; }
.pair .explain { grid-column: 1 / -1; color: var(--text-muted); font-size: 12px; }

.empty { color: var(--text-muted); text-align: center; padding: 32px; }
.more { display: block; margin: 16px auto 0; }
</style>
</head>
<body>
<div class="layout">
  <aside>
    <div class="brand">dupdash</div>
    <a href="#analytics">Analytics</a>
    <a href="#duplicates" class="active">Duplicate APIs</a>
  </aside>

  <main>
    <header>
      <div>
        <h1>Duplicate APIs Detection</h1>
        <div class="subtitle" id="last-scan">No scan yet</div>
      </div>
      <button class="btn primary" id="btn-scan">Scan for Duplicates</button>
    </header>

    <div class="error-panel" id="error-panel">
      <span id="error-text"></span>
      <span>
        <button class="btn" id="btn-retry">Try Again</button>
        <button class="btn" id="btn-dismiss">Dismiss</button>
      </span>
    </div>

    <div class="card" id="analytics">
      <h2>Analytics</h2>
      <div class="frame-wrap">
        <iframe id="analytics-frame" title="Analytics report"
          sandbox="allow-scripts allow-same-origin allow-popups allow-forms"></iframe>
        <div class="frame-state" id="frame-state">Loading analytics…</div>
      </div>
    </div>

    <div id="duplicates">
      <div class="stats-grid">
        <div class="stat-card"><div class="value" id="stat-total">—</div><div class="label">Total Duplicates</div></div>
        <div class="stat-card"><div class="value high" id="stat-high">—</div><div class="label">High Similarity (≥95%)</div></div>
        <div class="stat-card"><div class="value medium" id="stat-medium">—</div><div class="label">Medium (85–94%)</div></div>
        <div class="stat-card"><div class="value low" id="stat-low">—</div><div class="label">Low (&lt;85%)</div></div>
      </div>

      <div class="tabs" id="tabs"></div>
      <input class="search" id="search" type="search" placeholder="Search by API name, description or category…">
      <div id="groups"><div class="empty">Run a scan to find duplicate APIs.</div></div>
    </div>
  </main>
</div>

<script>
// ---------------------------------------------------------------------------
// State
// ---------------------------------------------------------------------------
const SEARCH_DEBOUNCE_MS = 300;
let activeCategory = 'All Categories';
let searchTerm = '';
let polling = null;
let searchTimer = null;
let pageSize = 12;
let shownGroups = pageSize;
let lastGroups = [];

// ---------------------------------------------------------------------------
// API helpers
// ---------------------------------------------------------------------------
async function api(method, path) {
  const res = await fetch(path, { method });
  return { status: res.status, body: await res.json() };
}

function fmt(n) {
  if (n === undefined || n === null) return '—';
  return n.toLocaleString();
}

// ---------------------------------------------------------------------------
// Scan lifecycle
// ---------------------------------------------------------------------------
async function startScan() {
  const { status, body } = await api('POST', '/api/scan');
  if (status !== 202 && status !== 409) {
    showError(body.error || 'Failed to start scan');
    return;
  }
  setLoading(true);
  pollState();
}

function pollState() {
  clearTimeout(polling);
  polling = setTimeout(loadState, 500);
}

async function loadState() {
  const { body: s } = await api('GET', '/api/state');
  setLoading(s.loading);
  if (s.loading) pollState();

  if (s.error) showError(s.error); else hideError();

  document.getElementById('last-scan').textContent = s.last_scan_time
    ? 'Last scan: ' + new Date(s.last_scan_time).toLocaleString()
    : 'No scan yet';

  const frame = document.getElementById('analytics-frame');
  if (s.analytics_url && frame.getAttribute('src') !== s.analytics_url) {
    frame.setAttribute('src', s.analytics_url);
  }

  const st = s.statistics || {};
  document.getElementById('stat-total').textContent = fmt(st.totalDuplicates);
  document.getElementById('stat-high').textContent = fmt(st.highSimilarity);
  document.getElementById('stat-medium').textContent = fmt(st.mediumSimilarity);
  document.getElementById('stat-low').textContent = fmt(st.lowSimilarity);

  if (s.page_size !== undefined && s.page_size !== pageSize) {
    pageSize = s.page_size;
    shownGroups = pageSize;
  }
  renderTabs(s.categories || [], s.category_stats || {});
  if (!s.loading) loadDuplicates();
}

function setLoading(on) {
  const btn = document.getElementById('btn-scan');
  btn.disabled = on;
  btn.textContent = on ? 'Scanning…' : 'Scan for Duplicates';
}

// ---------------------------------------------------------------------------
// Error panel
// ---------------------------------------------------------------------------
function showError(msg) {
  document.getElementById('error-text').textContent = msg;
  document.getElementById('error-panel').classList.add('show');
}

function hideError() {
  document.getElementById('error-panel').classList.remove('show');
}

async function dismissError() {
  await api('POST', '/api/error/clear');
  hideError();
}

// ---------------------------------------------------------------------------
// Tabs and groups
// ---------------------------------------------------------------------------
function renderTabs(categories, counts) {
  document.getElementById('tabs').innerHTML = categories.map(c =>
    `<button data-category="${esc(c)}" class="${c === activeCategory ? 'active' : ''}">` +
    `${esc(c)}<span class="count">${fmt(counts[c] || 0)}</span></button>`
  ).join('');
}

async function loadDuplicates() {
  const q = new URLSearchParams({ category: activeCategory, search: searchTerm });
  const { body } = await api('GET', '/api/duplicates?' + q.toString());
  lastGroups = body.groups || [];
  renderGroups(lastGroups);
}

function renderGroups(groups) {
  const el = document.getElementById('groups');
  if (groups.length === 0) {
    el.innerHTML = searchTerm.trim()
      ? `<div class="empty">No groups match “${esc(searchTerm)}”.</div>`
      : `<div class="empty">No duplicates found in ${esc(activeCategory)}.</div>`;
    return;
  }
  const visible = pageSize > 0 ? groups.slice(0, shownGroups) : groups;
  const rest = groups.length - visible.length;
  el.innerHTML = visible.map(renderGroup).join('') +
    (rest > 0 ? `<button class="btn more" id="btn-more">Show more (${fmt(rest)} remaining)</button>` : '');
}

function renderGroup(g) {
  return `<div class="group${g.expanded ? ' open' : ''}">
    <div class="group-head">
      <span class="score" style="color:${g.color}">${g.similarity_score_percentage}%</span>
      <span class="level" style="color:${g.color}">${g.level}</span>
      <span class="meta">${g.api_count} APIs · ${g.pair_count} pairs</span>
    </div>
    <div class="group-body">${g.pairs.map(renderPair).join('')}</div>
  </div>`;
}

function renderPair(p) {
  return `<div class="pair">
    ${renderApi(p.source)}
    <div class="arrow">→<br>${p.similarity_score}%</div>
    ${renderApi(p.destination)}
    ${p.explanation ? `<div class="explain">${esc(p.explanation)}</div>` : ''}
  </div>`;
}

function renderApi(a) {
  return `<div class="api">
    <div class="name">${esc(a.name)}</div>
    <div class="sub">v${esc(a.version)} · OpenAPI ${esc(a.openapi_version)} · ${esc(a.contract_id)}</div>
    <div class="sub" title="${esc(a.description)}">${esc(a.description_preview)}</div>
    <span class="cat" style="background:${a.category_color}">${esc(a.category)}</span>
  </div>`;
}

// ---------------------------------------------------------------------------
// Events
// ---------------------------------------------------------------------------
document.getElementById('btn-scan').addEventListener('click', startScan);
document.getElementById('btn-retry').addEventListener('click', startScan);
document.getElementById('btn-dismiss').addEventListener('click', dismissError);

document.getElementById('tabs').addEventListener('click', e => {
  const btn = e.target.closest('button');
  if (!btn) return;
  activeCategory = btn.dataset.category;
  shownGroups = pageSize;
  loadState();
});

document.getElementById('search').addEventListener('input', e => {
  searchTerm = e.target.value;
  shownGroups = pageSize;
  clearTimeout(searchTimer);
  searchTimer = setTimeout(loadDuplicates, SEARCH_DEBOUNCE_MS);
});

document.getElementById('groups').addEventListener('click', e => {
  if (e.target.id === 'btn-more') {
    shownGroups += pageSize;
    renderGroups(lastGroups);
    return;
  }
  const head = e.target.closest('.group-head');
  if (head) head.parentElement.classList.toggle('open');
});

const frame = document.getElementById('analytics-frame');
frame.addEventListener('load', () => {
  document.getElementById('frame-state').style.display = 'none';
});
frame.addEventListener('error', () => {
  document.getElementById('frame-state').textContent = 'Failed to load analytics report.';
});

// ---------------------------------------------------------------------------
// Utility
// ---------------------------------------------------------------------------
function esc(s) {
  if (!s) return '';
  return String(s).replace(/&/g,'&amp;').replace(/</g,'&lt;').replace(/>/g,'&gt;').replace(/"/g,'&quot;');
}

// ---------------------------------------------------------------------------
// Init
// ---------------------------------------------------------------------------
loadState();
</script>
</body>
</html>"##;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn search_is_debounced_and_groups_paginated() {
        assert!(INDEX_HTML.contains("const SEARCH_DEBOUNCE_MS = 300;"));
        assert!(INDEX_HTML.contains("s.page_size"));
        assert!(INDEX_HTML.contains("id=\"btn-more\""));
    }

    #[test]
    fn page_wires_every_endpoint() {
        for path in ["/api/scan", "/api/state", "/api/duplicates?", "/api/error/clear"] {
            assert!(INDEX_HTML.contains(path), "frontend does not call {path}");
        }
    }

    #[test]
    fn analytics_frame_is_sandboxed() {
        assert!(INDEX_HTML.contains("<iframe id=\"analytics-frame\""));
        assert!(INDEX_HTML.contains("sandbox=\""));
    }
}
