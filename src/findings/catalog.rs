// src/findings/catalog.rs
// =============================================================================
// Bilingual (English / Romanian) copy for every finding id.
//
// Ids are stable across runs and releases; reports are compared by id.
// IDX_CANONICAL_NON_200_TARGET has two texts: one for a target that answered
// with a non-200 status and one for a target that could not be reached.
// =============================================================================

use crate::findings::model::FindingCopy;

pub const ROBOTS_UNREACHABLE: FindingCopy = FindingCopy {
    id: "IDX_ROBOTS_UNREACHABLE",
    title_en: "robots.txt is unreachable",
    title_ro: "robots.txt nu este accesibil",
    description_en: "We could not retrieve robots.txt, so crawl directives for search engines cannot be confirmed.",
    description_ro: "Nu am putut prelua robots.txt, astfel că directivele de crawl pentru motoarele de căutare nu pot fi confirmate.",
    recommendation_en: "Ensure /robots.txt is accessible and returns HTTP 200.",
    recommendation_ro: "Asigurați accesibilitatea fișierului /robots.txt (HTTP 200).",
};

pub const ROBOTS_MISSING: FindingCopy = FindingCopy {
    id: "IDX_ROBOTS_MISSING",
    title_en: "robots.txt is missing",
    title_ro: "robots.txt lipsește",
    description_en: "The site does not expose a robots.txt file.",
    description_ro: "Site-ul nu expune un fișier robots.txt.",
    recommendation_en: "Add a simple robots.txt to document crawl rules and sitemap location.",
    recommendation_ro: "Adăugați un robots.txt simplu pentru a documenta regulile de crawl și locația sitemap-ului.",
};

pub const ROBOTS_HAS_BROAD_DISALLOW: FindingCopy = FindingCopy {
    id: "IDX_ROBOTS_HAS_BROAD_DISALLOW",
    title_en: "robots.txt blocks all paths for a crawler",
    title_ro: "robots.txt blochează toate rutele pentru un crawler",
    description_en: "robots.txt includes a Disallow: / rule for a major user agent, which blocks crawling of the entire site.",
    description_ro: "robots.txt include o regulă Disallow: / pentru un user agent major, ceea ce blochează crawl-ul întregului site.",
    recommendation_en: "Remove or narrow the Disallow: / rule unless the site should be fully blocked.",
    recommendation_ro: "Eliminați sau restrângeți regula Disallow: / dacă site-ul nu trebuie blocat complet.",
};

pub const ROBOTS_BLOCKS_IMPORTANT_PAGES: FindingCopy = FindingCopy {
    id: "IDX_ROBOTS_BLOCKS_IMPORTANT_PAGES",
    title_en: "robots.txt blocks important pages",
    title_ro: "robots.txt blochează pagini importante",
    description_en: "robots.txt disallows crawling of one or more important pages.",
    description_ro: "robots.txt interzice crawl-ul pentru una sau mai multe pagini importante.",
    recommendation_en: "Allow crawling for the listed pages if they should be indexed.",
    recommendation_ro: "Permiteți crawl-ul pentru paginile listate dacă trebuie indexate.",
};

pub const PAGES_SKIPPED_BY_ROBOTS: FindingCopy = FindingCopy {
    id: "IDX_PAGES_SKIPPED_BY_ROBOTS",
    title_en: "Some pages were not analyzed because robots.txt disallows them",
    title_ro: "Unele pagini nu au fost analizate deoarece robots.txt le interzice",
    description_en: "These pages were selected for analysis but robots.txt disallows crawling them, so they were not fetched.",
    description_ro: "Aceste pagini au fost selectate pentru analiză, dar robots.txt interzice crawl-ul lor, așa că nu au fost preluate.",
    recommendation_en: "Check that the listed pages are meant to be excluded from crawling.",
    recommendation_ro: "Verificați dacă paginile listate trebuie într-adevăr excluse de la crawl.",
};

pub const NOINDEX_META_PRESENT: FindingCopy = FindingCopy {
    id: "IDX_NOINDEX_META_PRESENT",
    title_en: "Noindex meta tag present",
    title_ro: "Tag meta noindex prezent",
    description_en: "A meta robots directive includes noindex on this page.",
    description_ro: "Un tag meta robots include noindex pe această pagină.",
    recommendation_en: "Remove noindex if this page should appear in search results.",
    recommendation_ro: "Eliminați noindex dacă această pagină trebuie să apară în rezultatele de căutare.",
};

pub const NOINDEX_HEADER_PRESENT: FindingCopy = FindingCopy {
    id: "IDX_NOINDEX_HEADER_PRESENT",
    title_en: "X-Robots-Tag header sets noindex",
    title_ro: "Headerul X-Robots-Tag setează noindex",
    description_en: "The response header includes a noindex directive.",
    description_ro: "Headerul de răspuns include o directivă noindex.",
    recommendation_en: "Remove noindex from X-Robots-Tag if this page should be indexed.",
    recommendation_ro: "Eliminați noindex din X-Robots-Tag dacă pagina trebuie indexată.",
};

pub const NOINDEX_CONFLICTING_DIRECTIVES: FindingCopy = FindingCopy {
    id: "IDX_NOINDEX_CONFLICTING_DIRECTIVES",
    title_en: "Conflicting index directives detected",
    title_ro: "Directive de indexare în conflict",
    description_en: "The page includes both index and noindex directives across meta tags or headers.",
    description_ro: "Pagina include directive index și noindex în meta tag-uri sau headere.",
    recommendation_en: "Keep a single, consistent directive (index or noindex).",
    recommendation_ro: "Păstrați o singură directivă consecventă (index sau noindex).",
};

pub const CANONICAL_MISSING: FindingCopy = FindingCopy {
    id: "IDX_CANONICAL_MISSING",
    title_en: "Canonical tag is missing",
    title_ro: "Tag-ul canonical lipsește",
    description_en: "No canonical tag was found on this page.",
    description_ro: "Nu a fost găsit un tag canonical pe această pagină.",
    recommendation_en: "Add a canonical tag pointing to the preferred URL for this page.",
    recommendation_ro: "Adăugați un tag canonical către URL-ul preferat al paginii.",
};

pub const CANONICAL_MULTIPLE: FindingCopy = FindingCopy {
    id: "IDX_CANONICAL_MULTIPLE",
    title_en: "Multiple canonical tags detected",
    title_ro: "Mai multe tag-uri canonical detectate",
    description_en: "More than one canonical tag was found on this page.",
    description_ro: "A fost găsit mai mult de un tag canonical pe această pagină.",
    recommendation_en: "Keep a single canonical tag to avoid ambiguity.",
    recommendation_ro: "Păstrați un singur tag canonical pentru a evita ambiguitatea.",
};

pub const CANONICAL_NON_200_TARGET: FindingCopy = FindingCopy {
    id: "IDX_CANONICAL_NON_200_TARGET",
    title_en: "Canonical target is not reachable (non-200)",
    title_ro: "Ținta canonical nu este accesibilă (non-200)",
    description_en: "The canonical URL does not return HTTP 200.",
    description_ro: "URL-ul canonical nu returnează HTTP 200.",
    recommendation_en: "Fix the canonical target to return HTTP 200.",
    recommendation_ro: "Corectați ținta canonical astfel încât să returneze HTTP 200.",
};

pub const CANONICAL_TARGET_UNREACHABLE: FindingCopy = FindingCopy {
    id: "IDX_CANONICAL_NON_200_TARGET",
    title_en: "Canonical target is unreachable",
    title_ro: "Ținta canonical nu este accesibilă",
    description_en: "The canonical URL could not be reached.",
    description_ro: "URL-ul canonical nu a putut fi accesat.",
    recommendation_en: "Ensure the canonical target is reachable and returns HTTP 200.",
    recommendation_ro: "Asigurați-vă că ținta canonical este accesibilă și returnează HTTP 200.",
};

pub const CANONICAL_POINTS_OFFPAGE: FindingCopy = FindingCopy {
    id: "IDX_CANONICAL_POINTS_OFFPAGE",
    title_en: "Canonical points to a different page",
    title_ro: "Canonical indică o altă pagină",
    description_en: "These pages declare a canonical URL that points to a different URL (often the site root/homepage) instead of the page's own URL.",
    description_ro: "Aceste pagini declară un URL canonical care indică un URL diferit (adesea rădăcina site-ului/homepage) în locul propriului URL al paginii.",
    recommendation_en: "Confirm whether these pages should canonicalize to the homepage. If not, set each page's canonical to its preferred URL.",
    recommendation_ro: "Confirmați dacă aceste pagini trebuie să aibă canonical către homepage. Dacă nu, setați canonical pentru fiecare pagină către URL-ul preferat.",
};

pub const PAGE_STATUS_4XX: FindingCopy = FindingCopy {
    id: "IDX_PAGE_STATUS_4XX",
    title_en: "Page returns a 4xx status code",
    title_ro: "Pagina returnează un cod 4xx",
    description_en: "This page returns a client error response.",
    description_ro: "Această pagină returnează o eroare de tip client.",
    recommendation_en: "Fix the URL or restore the page so it returns HTTP 200.",
    recommendation_ro: "Corectați URL-ul sau restaurați pagina pentru a returna HTTP 200.",
};

pub const PAGE_STATUS_5XX: FindingCopy = FindingCopy {
    id: "IDX_PAGE_STATUS_5XX",
    title_en: "Page returns a 5xx status code",
    title_ro: "Pagina returnează un cod 5xx",
    description_en: "This page returns a server error response.",
    description_ro: "Această pagină returnează o eroare de tip server.",
    recommendation_en: "Fix the server error and ensure the page returns HTTP 200.",
    recommendation_ro: "Remediați eroarea de server și asigurați returnarea HTTP 200.",
};

pub const PAGE_UNREACHABLE: FindingCopy = FindingCopy {
    id: "IDX_PAGE_UNREACHABLE",
    title_en: "Page could not be fetched",
    title_ro: "Pagina nu a putut fi preluată",
    description_en: "The request for this page failed before a response was received (timeout, connection error, size limit or a blocked address).",
    description_ro: "Cererea pentru această pagină a eșuat înainte de a primi un răspuns (timeout, eroare de conexiune, limită de dimensiune sau adresă blocată).",
    recommendation_en: "Make sure the page is reachable over the public internet and responds quickly with HTTP 200.",
    recommendation_ro: "Asigurați-vă că pagina este accesibilă public și răspunde rapid cu HTTP 200.",
};

pub const REDIRECT_CHAIN: FindingCopy = FindingCopy {
    id: "IDX_REDIRECT_CHAIN",
    title_en: "Redirect chain detected",
    title_ro: "Lanț de redirect detectat",
    description_en: "This URL redirects multiple times before reaching the final page.",
    description_ro: "Acest URL redirecționează de mai multe ori până la pagina finală.",
    recommendation_en: "Reduce redirect hops to improve crawl efficiency and consistency.",
    recommendation_ro: "Reduceți numărul de redirect-uri pentru eficiență și consistență.",
};

pub const REDIRECT_LOOP_OR_TOO_MANY: FindingCopy = FindingCopy {
    id: "IDX_REDIRECT_LOOP_OR_TOO_MANY",
    title_en: "Redirect loop or too many redirects",
    title_ro: "Buclă de redirect sau prea multe redirect-uri",
    description_en: "The URL could not be resolved due to a redirect loop or too many hops.",
    description_ro: "URL-ul nu a putut fi rezolvat din cauza unei bucle de redirect sau a prea multor pași.",
    recommendation_en: "Fix the redirect rules so the URL resolves to a single final page.",
    recommendation_ro: "Corectați regulile de redirect pentru a ajunge la o singură pagină finală.",
};

pub const SITEMAP_MISSING: FindingCopy = FindingCopy {
    id: "IDX_SITEMAP_MISSING",
    title_en: "Sitemap not found",
    title_ro: "Sitemap inexistent",
    description_en: "No sitemap was found via robots.txt or common sitemap locations.",
    description_ro: "Nu a fost găsit un sitemap în robots.txt sau la locațiile uzuale.",
    recommendation_en: "Publish a sitemap and reference it in robots.txt.",
    recommendation_ro: "Publicați un sitemap și menționați-l în robots.txt.",
};

pub const SITEMAP_DECLARED_BUT_UNREACHABLE: FindingCopy = FindingCopy {
    id: "IDX_SITEMAP_DECLARED_BUT_UNREACHABLE",
    title_en: "Declared sitemap is unreachable",
    title_ro: "Sitemap declarat este inaccesibil",
    description_en: "robots.txt declares a sitemap that cannot be fetched.",
    description_ro: "robots.txt declară un sitemap care nu poate fi accesat.",
    recommendation_en: "Fix the sitemap URL or ensure it returns HTTP 200.",
    recommendation_ro: "Corectați URL-ul sitemap-ului sau asigurați returnarea HTTP 200.",
};

pub const SITEMAP_INVALID_XML: FindingCopy = FindingCopy {
    id: "IDX_SITEMAP_INVALID_XML",
    title_en: "Sitemap XML is invalid",
    title_ro: "XML-ul sitemap-ului este invalid",
    description_en: "A sitemap URL returned HTTP 200 but could not be parsed as XML.",
    description_ro: "Un sitemap a returnat HTTP 200, dar nu a putut fi interpretat ca XML.",
    recommendation_en: "Fix the sitemap XML format and revalidate.",
    recommendation_ro: "Corectați formatul XML al sitemap-ului și revalidați.",
};

pub const SITEMAP_URLS_UNREACHABLE_SAMPLE: FindingCopy = FindingCopy {
    id: "IDX_SITEMAP_URLS_UNREACHABLE_SAMPLE",
    title_en: "Sampled sitemap URLs are unreachable",
    title_ro: "URL-urile din sitemap eșantionate sunt inaccesibile",
    description_en: "Some sampled URLs from the sitemap did not return a successful response.",
    description_ro: "Unele URL-uri eșantionate din sitemap nu au returnat un răspuns de succes.",
    recommendation_en: "Remove or fix unreachable URLs in the sitemap.",
    recommendation_ro: "Eliminați sau corectați URL-urile inaccesibile din sitemap.",
};

pub const IMPORTANT_PAGE_NOT_DISCOVERABLE: FindingCopy = FindingCopy {
    id: "IDX_IMPORTANT_PAGE_NOT_DISCOVERABLE",
    title_en: "Important page is not discoverable by search engines",
    title_ro: "Pagina importantă nu este ușor descoperibilă de motoarele de căutare",
    description_en: "This page is indexable, but we could not find a clear discovery path via internal links or sitemap references.",
    description_ro: "Pagina este indexabilă, dar nu am identificat o cale clară de descoperire prin linkuri interne sau sitemap.",
    recommendation_en: "Link this page from the homepage or include it in the sitemap.",
    recommendation_ro: "Adăugați un link către această pagină din homepage sau includeți-o în sitemap.",
};
