use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{
    domain::{Artwork, ArtworkId},
    error::PageBodyError,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pagination {
    pub current_page: u32,
    pub total_pages: u32,
    pub total: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
}

impl Pagination {
    pub fn is_last_page(&self) -> bool {
        self.current_page >= self.total_pages
    }
}

/// `GET /artworks` response body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtworkPage {
    pub data: Vec<Artwork>,
    pub pagination: Pagination,
}

impl ArtworkPage {
    /// Decodes a page body, rejecting bodies whose `data` is absent or not a list.
    pub fn from_value(mut body: Value) -> Result<Self, PageBodyError> {
        let data = match body.get_mut("data").map(Value::take) {
            Some(Value::Array(items)) => items,
            _ => return Err(PageBodyError::MissingData),
        };
        let pagination = match body.get_mut("pagination").map(Value::take) {
            Some(value @ Value::Object(_)) => serde_json::from_value::<Pagination>(value)?,
            _ => return Err(PageBodyError::MissingPagination),
        };
        let data = data
            .into_iter()
            .map(serde_json::from_value::<Artwork>)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { data, pagination })
    }

    pub fn ids(&self) -> impl Iterator<Item = ArtworkId> + '_ {
        self.data.iter().map(|artwork| artwork.id)
    }
}

/// Paginator callback payload: `page` is zero-indexed, `rows` is the page size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageEvent {
    pub page: u32,
    pub rows: u32,
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn artwork_json(id: i64) -> Value {
        json!({
            "id": id,
            "title": format!("work {id}"),
            "place_of_origin": "Chicago",
            "artist_display": "Unknown",
            "inscriptions": null,
            "date_start": 1900,
            "date_end": 1901
        })
    }

    #[test]
    fn decodes_well_formed_page() {
        let body = json!({
            "data": [artwork_json(10), artwork_json(11)],
            "pagination": { "current_page": 1, "total_pages": 2, "total": 4, "limit": 2 }
        });
        let page = ArtworkPage::from_value(body).expect("page");
        assert_eq!(page.ids().collect::<Vec<_>>(), vec![ArtworkId(10), ArtworkId(11)]);
        assert_eq!(page.pagination.total, 4);
        assert!(!page.pagination.is_last_page());
    }

    #[test]
    fn rejects_data_that_is_not_a_list() {
        let body = json!({
            "data": { "id": 10 },
            "pagination": { "current_page": 1, "total_pages": 1, "total": 1 }
        });
        let err = ArtworkPage::from_value(body).expect_err("must reject");
        assert!(matches!(err, PageBodyError::MissingData));
    }

    #[test]
    fn rejects_missing_pagination() {
        let body = json!({ "data": [] });
        let err = ArtworkPage::from_value(body).expect_err("must reject");
        assert!(matches!(err, PageBodyError::MissingPagination));
    }
}
