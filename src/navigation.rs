//! This file defines the templates and a convenience function for creating the navigation bar.

use maud::{Markup, html};

use crate::{Currency, endpoints};

/// Template for a link in the navigation bar.
///
/// It will change appearance if `is_current` is set to
/// `true`. Only one link should be set as active at any one time.
#[derive(Clone)]
struct Link<'a> {
    url: &'a str,
    title: &'a str,
    is_current: bool,
}

impl Link<'_> {
    fn into_html(self) -> Markup {
        let style = if self.is_current {
            "block py-2 px-3 text-white bg-blue-700 rounded-sm lg:bg-transparent
        lg:text-blue-700 lg:p-0 dark:text-white lg:dark:text-blue-500"
        } else {
            "block py-2 px-3 text-gray-900 rounded-sm hover:bg-gray-100
        lg:hover:bg-transparent lg:border-0 lg:hover:text-blue-700 lg:p-0
        dark:text-white lg:dark:hover:text-blue-500 dark:hover:bg-gray-700
        dark:hover:text-white lg:dark:hover:bg-transparent"
        };

        html!( a href=(self.url) class=(style) aria-current=[self.is_current.then_some("page")] { (self.title) } )
    }
}

pub struct NavBar<'a> {
    links: Vec<Link<'a>>,
    currency: Currency,
}

impl NavBar<'_> {
    /// Get the navigation bar.
    ///
    /// If a link matches `active_endpoint`, then that link will be
    /// marked as active and displayed differently in the HTML.
    /// `currency` is the display currency shown on the toggle.
    pub fn new(active_endpoint: &str, currency: Currency) -> NavBar<'_> {
        let links = vec![
            Link {
                url: endpoints::DASHBOARD_VIEW,
                title: "Dashboard",
                is_current: active_endpoint == endpoints::DASHBOARD_VIEW,
            },
            Link {
                url: endpoints::HISTORY_VIEW,
                title: "History",
                is_current: active_endpoint == endpoints::HISTORY_VIEW,
            },
            Link {
                url: endpoints::LOG_OUT,
                title: "Log out",
                is_current: false,
            },
        ];

        NavBar { links, currency }
    }

    pub fn into_html(self) -> Markup {
        let next_currency = self.currency.toggle();

        // Template adapted from https://flowbite.com/docs/components/navbar/#default-navbar
        html!(
            nav class="bg-white border-gray-200 dark:bg-gray-900"
            {
                div
                    class="max-w-screen-xl flex flex-wrap items-center justify-between mx-auto p-4"
                {
                    a
                        href=(endpoints::DASHBOARD_VIEW)
                        class="flex items-center space-x-3 rtl:space-x-reverse"
                    {
                        span
                            class="self-center text-2xl font-semibold whitespace-nowrap dark:text-white"
                        {
                            "Pocket Ledger"
                        }
                    }

                    ul
                        class="font-medium flex flex-row items-center p-0 space-x-8
                        rtl:space-x-reverse dark:text-white"
                    {
                        @for link in self.links {
                            li { (link.into_html()) }
                        }

                        li
                        {
                            a
                                href=(endpoints::TOGGLE_CURRENCY)
                                id="currency-toggle"
                                title={ "Show amounts in " (next_currency.code()) }
                                class="block py-2 px-3 rounded-sm border border-gray-300
                                dark:border-gray-600 hover:bg-gray-100 dark:hover:bg-gray-700"
                            {
                                (self.currency.symbol()) " " (self.currency.code())
                            }
                        }
                    }
                }
            }
        )
    }
}

#[cfg(test)]
mod nav_bar_tests {
    use std::collections::HashMap;

    use scraper::{Html, Selector};

    use crate::{Currency, endpoints, navigation::NavBar};

    #[test]
    fn set_active_endpoint() {
        let mut cases = HashMap::new();
        cases.insert(endpoints::DASHBOARD_VIEW, true);
        cases.insert(endpoints::HISTORY_VIEW, true);

        cases.insert(endpoints::ROOT, false);
        cases.insert(endpoints::AUTH, false);
        cases.insert(endpoints::ADD_TRANSACTION, false);
        cases.insert(endpoints::INTERNAL_ERROR_VIEW, false);
        cases.insert(endpoints::LOG_OUT, false);

        for (endpoint, should_be_active) in cases {
            let nav_bar = NavBar::new(endpoint, Currency::Usd);

            assert_link_active(nav_bar, endpoint, should_be_active);
        }
    }

    #[test]
    fn shows_currency_toggle() {
        let html = NavBar::new(endpoints::DASHBOARD_VIEW, Currency::Inr)
            .into_html()
            .into_string();
        let html = Html::parse_fragment(&html);

        let toggle = html
            .select(&Selector::parse("#currency-toggle").unwrap())
            .next()
            .expect("No currency toggle found");

        assert_eq!(toggle.value().attr("href"), Some(endpoints::TOGGLE_CURRENCY));
        assert_eq!(toggle.text().collect::<String>().trim(), "₹ INR");
    }

    #[track_caller]
    fn assert_link_active(nav_bar: NavBar<'_>, endpoint: &str, should_be_active: bool) {
        let get_active_string = |is_active: bool| -> &str {
            if is_active {
                "active (true)"
            } else {
                "inactive (false)"
            }
        };

        for link in nav_bar.links {
            if link.url == endpoint {
                assert_eq!(
                    link.is_current,
                    should_be_active,
                    "Link for current page should be {} but got {}",
                    get_active_string(should_be_active),
                    get_active_string(link.is_current),
                )
            } else {
                assert!(
                    !link.is_current,
                    "Link for inactive page should {} but got {}",
                    get_active_string(false),
                    get_active_string(link.is_current)
                )
            }
        }
    }
}
