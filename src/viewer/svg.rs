use log::debug;

use super::model::ViewerModel;
use crate::error::Result;
use crate::layers::XmlElement;

impl ViewerModel {
    /// SVG document of every visible layer's current slice, bottom layer
    /// first. Without a `view_box` the canvas spans the bounding box of the
    /// last two displayed axes.
    pub fn to_svg(&self, view_box: Option<[f64; 4]>) -> Result<String> {
        let (min, max) = self.calc_bbox();
        let displayed = self.dims().displayed();
        let plane = &displayed[displayed.len().saturating_sub(2)..];
        let corner = |bound: &[f64], position: usize| {
            plane
                .get(position)
                .and_then(|axis| bound.get(*axis))
                .copied()
                .unwrap_or_default()
        };
        let (row, col) = (corner(min.as_slice(), 0), corner(min.as_slice(), 1));
        let height = corner(max.as_slice(), 0) - row;
        let width = corner(max.as_slice(), 1) - col;

        let mut svg = XmlElement::new("svg")
            .attr("xmlns", "http://www.w3.org/2000/svg")
            .attr("xmlns:xlink", "http://www.w3.org/1999/xlink")
            .attr("width", width)
            .attr("height", height);
        if let Some([x, y, w, h]) = view_box {
            svg = svg.attr("viewBox", format!("{x} {y} {w} {h}"));
        }

        let mut group =
            XmlElement::new("g").attr("transform", format!("translate({}, {})", -col, -row));
        for layer in self.layers().iter().filter(|layer| layer.base().visible()) {
            let elements = layer.to_xml_list()?;
            debug!("layer `{}` exported {} svg elements", layer.name(), elements.len());
            for element in elements {
                group = group.child(element);
            }
        }
        svg = svg.child(group);
        Ok(format!("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n{svg}\n"))
    }
}
