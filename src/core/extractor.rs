use log::{debug, warn};
use scraper::{ElementRef, Html, Selector};

/// suno.com 페이지 제목 뒤에 붙는 장식 문자열.
const TITLE_SUFFIX: &str = " | Suno";

/// 읽기 전용 DOM 래퍼. 첫 번째 요소 검색과 속성 조회만 제공한다.
pub struct Page {
    document: Html,
}

impl Page {
    pub fn parse(html: &str) -> Self {
        Self {
            document: Html::parse_document(html),
        }
    }

    /// 문서 순서상 첫 번째 `tag` 요소를 찾는다.
    pub fn find_first(&self, tag: &str) -> Option<ElementRef<'_>> {
        let selector = Selector::parse(tag).ok()?;
        self.document.select(&selector).next()
    }

    pub fn attribute<'a>(&self, element: ElementRef<'a>, name: &str) -> Option<&'a str> {
        element.value().attr(name)
    }
}

/// `<title>` 텍스트에서 ` | Suno` 서픽스를 제거해 곡 제목을 얻는다.
pub fn extract_title(html: &str) -> Option<String> {
    title_from_page(&Page::parse(html))
}

/// 첫 번째 `<img>`의 `src` 값을 그대로 반환한다. URL 형식은 검사하지 않는다.
pub fn extract_cover_url(html: &str) -> Option<String> {
    cover_url_from_page(&Page::parse(html))
}

fn title_from_page(page: &Page) -> Option<String> {
    let Some(element) = page.find_first("title") else {
        warn!("페이지에 title 요소가 없습니다");
        return None;
    };

    let text = element.text().collect::<String>();
    let text = text.trim();
    let title = text.strip_suffix(TITLE_SUFFIX).unwrap_or(text);

    if title.is_empty() {
        warn!("곡 제목이 비어 있습니다");
        return None;
    }

    debug!("곡 제목: {}", title);
    Some(title.to_string())
}

fn cover_url_from_page(page: &Page) -> Option<String> {
    let img = page.find_first("img")?;
    page.attribute(img, "src").map(|s| s.to_string())
}
