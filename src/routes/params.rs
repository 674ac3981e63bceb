use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};

#[derive(Debug, Default, Deserialize, ToSchema, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct Pagination {
    /// Page number, default 1
    pub page: Option<i64>,
    /// Items per page, default 20
    pub per_page: Option<i64>,
}

impl Pagination {
    pub fn normalize(&self) -> (i64, i64, i64) {
        let page = self.page.unwrap_or(1).max(1);
        let per_page = self.per_page.unwrap_or(20).clamp(1, 100);
        let offset = (page - 1) * per_page;
        (page, per_page, offset)
    }
}

#[derive(Debug, Default, Deserialize, ToSchema, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ProductQuery {
    /// Page number, default 1
    pub page: Option<i64>,
    /// Items per page, default 20
    pub per_page: Option<i64>,
    /// Category slug
    pub category: Option<String>,
    /// Case-insensitive search over name and description
    pub q: Option<String>,
}

impl ProductQuery {
    pub fn pagination(&self) -> Pagination {
        Pagination {
            page: self.page,
            per_page: self.per_page,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_to_first_page_of_twenty() {
        assert_eq!(Pagination::default().normalize(), (1, 20, 0));
    }

    #[test]
    fn clamps_out_of_range_values() {
        let pagination = Pagination {
            page: Some(-3),
            per_page: Some(1000),
        };
        assert_eq!(pagination.normalize(), (1, 100, 0));

        let pagination = Pagination {
            page: Some(3),
            per_page: Some(0),
        };
        assert_eq!(pagination.normalize(), (3, 1, 2));
    }
}
